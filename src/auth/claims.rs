use serde::{Deserialize, Serialize};

/// Identity returned by the OAuth provider's user-info endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Session JWT payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,                // provider login
    pub name: Option<String>,       // display name
    pub email: Option<String>,      // may be hidden by the provider
    pub avatar_url: Option<String>, // profile picture
    pub iat: usize,                 // issued at (unix timestamp)
    pub exp: usize,                 // expires at (unix timestamp)
    pub iss: String,                // issuer
    pub aud: String,                // audience
}

impl SessionClaims {
    pub fn login(&self) -> &str {
        &self.sub
    }
}
