use anyhow::Context;
use serde::Deserialize;

const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const GITHUB_USER_INFO_URL: &str = "https://api.github.com/user";

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub ttl_minutes: i64,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub authorize_url: String,
    pub token_url: String,
    pub user_info_url: String,
    pub redirect_url: String,
    pub scope: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` selects the in-memory user store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub session: SessionConfig,
    /// `None` disables the login flow; sessions can still be verified.
    pub oauth: Option<OAuthConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let session = SessionConfig {
            secret: std::env::var("SESSION_SECRET").context("SESSION_SECRET must be set")?,
            ttl_minutes: parse_or("SESSION_TTL_MINUTES", 8 * 60),
            cookie_secure: parse_or("SESSION_COOKIE_SECURE", false),
        };

        let oauth = match (
            std::env::var("OAUTH_CLIENT_ID").ok(),
            std::env::var("OAUTH_CLIENT_SECRET").ok(),
        ) {
            (Some(client_id), Some(client_secret)) => Some(OAuthConfig {
                client_id,
                client_secret,
                authorize_url: var_or("OAUTH_AUTHORIZE_URL", GITHUB_AUTHORIZE_URL),
                token_url: var_or("OAUTH_TOKEN_URL", GITHUB_TOKEN_URL),
                user_info_url: var_or("OAUTH_USER_INFO_URL", GITHUB_USER_INFO_URL),
                redirect_url: var_or(
                    "OAUTH_REDIRECT_URL",
                    "http://localhost:8080/login/oauth2/code/github",
                ),
                scope: var_or("OAUTH_SCOPE", "read:user user:email"),
            }),
            _ => None,
        };

        Ok(Self {
            host: var_or("APP_HOST", "0.0.0.0"),
            port: parse_or("APP_PORT", 8080),
            database_url: std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10),
            session,
            oauth,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
