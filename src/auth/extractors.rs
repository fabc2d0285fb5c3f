use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
};
use axum_extra::extract::cookie::CookieJar;

use super::claims::SessionClaims;
use super::session::{SessionError, SessionKeys, SESSION_COOKIE};

/// Authenticated caller, resolved from a bearer token or the session cookie.
#[derive(Debug, Clone)]
pub struct Principal(pub SessionClaims);

/// Reads `Authorization: Bearer <token>` first, then the session cookie.
pub fn session_from_headers(
    headers: &HeaderMap,
    keys: &SessionKeys,
) -> Result<SessionClaims, SessionError> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(str::to_owned);

    let token = match bearer {
        Some(t) => t,
        None => CookieJar::from_headers(headers)
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_owned())
            .ok_or(SessionError::Missing)?,
    };

    keys.verify(&token)
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // already resolved by the route guard
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(principal.clone());
        }

        let keys = SessionKeys::from_ref(state);
        session_from_headers(&parts.headers, &keys)
            .map(Principal)
            .map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))
    }
}
