use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use rand::{distributions::Alphanumeric, Rng};
use reqwest::{header::ACCEPT, Url};
use serde::Deserialize;
use tracing::{error, info, instrument, warn};

use super::claims::Profile;
use super::session::{expired, SessionError, SessionKeys, SESSION_COOKIE, STATE_COOKIE};
use crate::{config::OAuthConfig, state::AppState};

const USER_AGENT: &str = concat!("webapp/", env!("CARGO_PKG_VERSION"));
const STATE_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("oauth login is not configured")]
    NotConfigured,
    #[error("missing or mismatched oauth state")]
    StateMismatch,
    #[error("missing authorization code")]
    MissingCode,
    #[error("authorization denied: {0}")]
    Denied(String),
    #[error("identity provider error: {0}")]
    Provider(String),
    #[error("identity provider unreachable: {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl IntoResponse for OAuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            OAuthError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            OAuthError::StateMismatch | OAuthError::MissingCode | OAuthError::Denied(_) => {
                StatusCode::BAD_REQUEST
            }
            OAuthError::Provider(_) | OAuthError::Http(_) => StatusCode::BAD_GATEWAY,
            OAuthError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self, "oauth login failed");
        } else {
            warn!(error = %self, "oauth login rejected");
        }
        (status, self.to_string()).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Authorization-code client for a GitHub-style provider.
#[derive(Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    config: OAuthConfig,
}

impl OAuthClient {
    pub fn new(config: OAuthConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { http, config })
    }

    pub fn authorize_url(&self, state: &str) -> anyhow::Result<Url> {
        let url = Url::parse_with_params(
            &self.config.authorize_url,
            &[
                ("response_type", "code"),
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("scope", self.config.scope.as_str()),
                ("state", state),
            ],
        )?;
        Ok(url)
    }

    pub async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let resp: TokenResponse = self
            .http
            .post(&self.config.token_url)
            .header(ACCEPT, "application/json")
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.config.redirect_url.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match resp {
            TokenResponse {
                access_token: Some(token),
                ..
            } => Ok(token),
            TokenResponse {
                error,
                error_description,
                ..
            } => Err(OAuthError::Provider(
                error_description
                    .or(error)
                    .unwrap_or_else(|| "no access token in response".into()),
            )),
        }
    }

    pub async fn fetch_profile(&self, access_token: &str) -> Result<Profile, OAuthError> {
        let profile = self
            .http
            .get(&self.config.user_info_url)
            .header(ACCEPT, "application/json")
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?
            .json::<Profile>()
            .await?;
        Ok(profile)
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/oauth2/authorization/github", get(authorize))
        .route("/login/oauth2/code/github", get(callback))
        .route("/logout", post(logout))
}

fn random_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LEN)
        .map(char::from)
        .collect()
}

#[instrument(skip(state, jar))]
pub async fn authorize(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), OAuthError> {
    let client = state.oauth.as_ref().ok_or(OAuthError::NotConfigured)?;
    let keys = SessionKeys::from_ref(&state);

    let csrf = random_state();
    let url = client
        .authorize_url(&csrf)
        .map_err(|e| OAuthError::Provider(e.to_string()))?;

    Ok((jar.add(keys.state_cookie(csrf)), Redirect::to(url.as_str())))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[instrument(skip(state, jar, params))]
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect), OAuthError> {
    let client = state.oauth.as_ref().ok_or(OAuthError::NotConfigured)?;

    let expected = jar.get(STATE_COOKIE).map(|c| c.value().to_owned());
    match (expected.as_deref(), params.state.as_deref()) {
        (Some(want), Some(got)) if want == got => {}
        _ => return Err(OAuthError::StateMismatch),
    }
    let jar = jar.remove(expired(STATE_COOKIE));

    if let Some(error) = params.error {
        return Err(OAuthError::Denied(error));
    }
    let code = params.code.ok_or(OAuthError::MissingCode)?;

    let access_token = client.exchange_code(&code).await?;
    let profile = client.fetch_profile(&access_token).await?;

    let keys = SessionKeys::from_ref(&state);
    let token = keys.sign(&profile)?;
    info!(login = %profile.login, "user signed in");

    Ok((jar.add(keys.session_cookie(token)), Redirect::to("/home")))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    (jar.remove(expired(SESSION_COOKIE)), Redirect::to("/"))
}
