use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header::LOCATION, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{error, instrument, warn};

use super::dto::UserRequest;
use super::repo_types::User;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, (StatusCode, String)> {
    let users = state.users.get_all_users().await.map_err(internal)?;
    Ok(Json(users))
}

#[instrument(skip(state, id))]
pub async fn get_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<User>, (StatusCode, String)> {
    let id = user_id(id)?;
    state
        .users
        .get_user_by_id(id)
        .await
        .map_err(internal)?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

#[instrument(skip(state, body))]
pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<UserRequest>, JsonRejection>,
) -> Result<(StatusCode, HeaderMap, Json<User>), (StatusCode, String)> {
    let user = user_body(body)?;
    let created = state.users.create_user(user).await.map_err(internal)?;

    let mut headers = HeaderMap::new();
    if let Some(id) = created.id {
        let location = HeaderValue::from_str(&format!("/api/users/{id}"))
            .map_err(|e| internal(e.into()))?;
        headers.insert(LOCATION, location);
    }

    Ok((StatusCode::CREATED, headers, Json(created)))
}

#[instrument(skip(state, id, body))]
pub async fn update_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<UserRequest>, JsonRejection>,
) -> Result<Json<User>, (StatusCode, String)> {
    let id = user_id(id)?;
    let details = user_body(body)?;
    state
        .users
        .update_user(id, details)
        .await
        .map_err(internal)?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

#[instrument(skip(state, id))]
pub async fn delete_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, (StatusCode, String)> {
    let id = user_id(id)?;
    if state.users.delete_user(id).await.map_err(internal)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

fn user_id(id: Result<Path<i64>, PathRejection>) -> Result<i64, (StatusCode, String)> {
    id.map(|Path(id)| id).map_err(|e| {
        warn!(error = %e, "invalid user id");
        (StatusCode::BAD_REQUEST, e.body_text())
    })
}

fn user_body(body: Result<Json<UserRequest>, JsonRejection>) -> Result<User, (StatusCode, String)> {
    let Json(req) = body.map_err(|e| {
        warn!(error = %e, "invalid user body");
        (StatusCode::BAD_REQUEST, e.body_text())
    })?;
    req.validate().map_err(|msg| {
        warn!(%msg, "user body failed validation");
        (StatusCode::BAD_REQUEST, msg)
    })
}

fn not_found(id: i64) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("user {id} not found"))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = ?e, "user storage failure");
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
}
