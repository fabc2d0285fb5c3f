use crate::state::AppState;
use axum::Router;

pub mod claims;
pub mod extractors;
pub mod guard;
pub mod oauth;
pub mod session;

pub use extractors::Principal;
pub use session::SessionKeys;

pub fn router() -> Router<AppState> {
    oauth::router()
}
