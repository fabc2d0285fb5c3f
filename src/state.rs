use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::auth::{oauth::OAuthClient, SessionKeys};
use crate::config::AppConfig;
use crate::users::{InMemoryUserStore, PgUserStore, UserService, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Present only when the Postgres store is in use.
    pub db: Option<PgPool>,
    pub users: UserService,
    pub session: SessionKeys,
    pub oauth: Option<OAuthClient>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let (db, store) = match &config.database_url {
            Some(url) => {
                let db = PgPoolOptions::new()
                    .max_connections(config.database_max_connections)
                    .connect(url)
                    .await
                    .context("connect to database")?;
                let store = Arc::new(PgUserStore::new(db.clone())) as Arc<dyn UserStore>;
                (Some(db), store)
            }
            None => {
                tracing::warn!("DATABASE_URL not set; users are kept in memory");
                (None, Arc::new(InMemoryUserStore::new()) as Arc<dyn UserStore>)
            }
        };

        let oauth = match &config.oauth {
            Some(c) => Some(OAuthClient::new(c.clone()).context("build oauth client")?),
            None => {
                tracing::warn!("OAUTH_CLIENT_ID/OAUTH_CLIENT_SECRET not set; login disabled");
                None
            }
        };

        Ok(Self {
            session: SessionKeys::new(&config.session),
            users: UserService::new(store),
            db,
            oauth,
            config,
        })
    }

    /// In-memory state for tests: fixed secret, provider on an unreachable port.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::{OAuthConfig, SessionConfig};

        let oauth_config = OAuthConfig {
            client_id: "test-client".into(),
            client_secret: "test-secret".into(),
            authorize_url: "http://127.0.0.1:9/login/oauth/authorize".into(),
            token_url: "http://127.0.0.1:9/login/oauth/access_token".into(),
            user_info_url: "http://127.0.0.1:9/user".into(),
            redirect_url: "http://localhost:8080/login/oauth2/code/github".into(),
            scope: "read:user".into(),
        };
        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            database_url: None,
            database_max_connections: 1,
            session: SessionConfig {
                secret: "test".into(),
                ttl_minutes: 5,
                cookie_secure: false,
            },
            oauth: Some(oauth_config.clone()),
        });

        Self {
            session: SessionKeys::new(&config.session),
            users: UserService::new(Arc::new(InMemoryUserStore::new())),
            db: None,
            oauth: Some(OAuthClient::new(oauth_config).expect("oauth client builds")),
            config,
        }
    }

    /// Bearer token for a fixed test identity.
    #[cfg(test)]
    pub fn test_token(&self) -> String {
        let profile = crate::auth::claims::Profile {
            login: "tester".into(),
            name: Some("Test User".into()),
            email: Some("tester@example.com".into()),
            avatar_url: Some("https://avatars.example.com/tester".into()),
        };
        self.session.sign(&profile).expect("sign test session")
    }
}
