use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::Html,
    routing::get,
    Router,
};
use tracing::{error, instrument};

use super::views;
use crate::{auth::guard::require_page_session, auth::Principal, state::AppState};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login))
}

pub fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/home", get(home))
        .route("/users", get(users))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_page_session,
        ))
}

pub async fn index(principal: Option<Principal>) -> Html<String> {
    Html(views::index(principal.as_ref().map(|p| &p.0)))
}

pub async fn login(State(state): State<AppState>) -> Html<String> {
    Html(views::login(state.oauth.is_some()))
}

#[instrument(skip(state, principal))]
pub async fn home(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Html<String>, (StatusCode, String)> {
    let users = state.users.get_all_users().await.map_err(internal)?;
    Ok(Html(views::home(&principal.0, &users)))
}

#[instrument(skip(state))]
pub async fn users(State(state): State<AppState>) -> Result<Html<String>, (StatusCode, String)> {
    let users = state.users.get_all_users().await.map_err(internal)?;
    Ok(Html(views::users(&users)))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = ?e, "page render failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
}
