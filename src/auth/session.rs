use std::time::Duration;

use axum::extract::FromRef;
use axum_extra::extract::cookie::{Cookie, SameSite};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::claims::{Profile, SessionClaims};
use crate::{config::SessionConfig, state::AppState};

pub const SESSION_COOKIE: &str = "SESSION";
pub const STATE_COOKIE: &str = "OAUTH_STATE";

const ISSUER: &str = "webapp";
const AUDIENCE: &str = "webapp-session";
const STATE_COOKIE_MINUTES: i64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no session")]
    Missing,
    #[error("invalid or expired session: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("failed to sign session: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),
}

/// Signing material and cookie policy for login sessions.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    cookie_secure: bool,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        state.session.clone()
    }
}

impl SessionKeys {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            ttl: Duration::from_secs(config.ttl_minutes.max(1) as u64 * 60),
            cookie_secure: config.cookie_secure,
        }
    }

    pub fn sign(&self, profile: &Profile) -> Result<String, SessionError> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = SessionClaims {
            sub: profile.login.clone(),
            name: profile.name.clone(),
            email: profile.email.clone(),
            avatar_url: profile.avatar_url.clone(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: ISSUER.into(),
            aud: AUDIENCE.into(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding).map_err(SessionError::Sign)?;
        debug!(login = %profile.login, "session signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let mut validation = Validation::default();
        validation.set_audience(&[AUDIENCE]);
        validation.set_issuer(&[ISSUER]);
        let data = decode::<SessionClaims>(token, &self.decoding, &validation)
            .map_err(SessionError::Invalid)?;
        Ok(data.claims)
    }

    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.cookie_secure)
            .max_age(TimeDuration::seconds(self.ttl.as_secs() as i64))
            .build()
    }

    pub fn state_cookie(&self, state: String) -> Cookie<'static> {
        Cookie::build((STATE_COOKIE, state))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.cookie_secure)
            .max_age(TimeDuration::minutes(STATE_COOKIE_MINUTES))
            .build()
    }
}

/// Removal cookie; the path must match the one the cookie was set with.
pub fn expired(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(secret: &str) -> SessionKeys {
        SessionKeys::new(&SessionConfig {
            secret: secret.into(),
            ttl_minutes: 5,
            cookie_secure: false,
        })
    }

    fn profile() -> Profile {
        Profile {
            login: "octocat".into(),
            name: Some("The Octocat".into()),
            email: Some("octocat@example.com".into()),
            avatar_url: Some("https://avatars.example.com/u/1".into()),
        }
    }

    #[test]
    fn sign_and_verify_round_trip() {
        let keys = keys("dev-secret");
        let token = keys.sign(&profile()).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.login(), "octocat");
        assert_eq!(claims.name.as_deref(), Some("The Octocat"));
        assert_eq!(claims.email.as_deref(), Some("octocat@example.com"));
        assert_eq!(claims.iss, ISSUER);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn verify_rejects_foreign_secret() {
        let token = keys("one").sign(&profile()).expect("sign");
        let err = keys("two").verify(&token).unwrap_err();
        assert!(matches!(err, SessionError::Invalid(_)));
    }

    #[test]
    fn verify_rejects_garbage() {
        assert!(keys("dev-secret").verify("not.a.jwt").is_err());
    }

    #[test]
    fn session_cookie_is_http_only() {
        let cookie = keys("dev-secret").session_cookie("tok".into());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }
}
