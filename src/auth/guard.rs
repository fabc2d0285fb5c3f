use axum::{
    extract::{FromRef, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use super::extractors::{session_from_headers, Principal};
use super::session::SessionKeys;
use crate::state::AppState;

/// Route-group guard for the JSON API: 401 without a valid session.
pub async fn require_api_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let keys = SessionKeys::from_ref(&state);
    match session_from_headers(req.headers(), &keys) {
        Ok(claims) => {
            req.extensions_mut().insert(Principal(claims));
            next.run(req).await
        }
        Err(e) => {
            debug!(error = %e, path = %req.uri().path(), "api request rejected");
            (StatusCode::UNAUTHORIZED, "authentication required").into_response()
        }
    }
}

/// Route-group guard for HTML pages: sends anonymous visitors to `/login`.
pub async fn require_page_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let keys = SessionKeys::from_ref(&state);
    match session_from_headers(req.headers(), &keys) {
        Ok(claims) => {
            req.extensions_mut().insert(Principal(claims));
            next.run(req).await
        }
        Err(e) => {
            debug!(error = %e, path = %req.uri().path(), "redirecting to login");
            Redirect::to("/login").into_response()
        }
    }
}
