use serde::Deserialize;

use super::repo_types::User;

const MAX_USERNAME_LEN: usize = 50;
const MAX_EMAIL_LEN: usize = 100;

/// Request body for create/update. A client-supplied `id` is accepted and ignored.
#[derive(Debug, Deserialize)]
pub struct UserRequest {
    #[serde(default)]
    pub id: Option<i64>,
    pub username: String,
    pub email: String,
}

impl UserRequest {
    /// Checks both fields are non-blank and fit their columns. Values are
    /// stored exactly as sent; whitespace only matters for the blank check.
    pub fn validate(self) -> Result<User, String> {
        if self.username.trim().is_empty() {
            return Err("username must not be blank".into());
        }
        if self.email.trim().is_empty() {
            return Err("email must not be blank".into());
        }
        if self.username.chars().count() > MAX_USERNAME_LEN {
            return Err(format!("username must be at most {MAX_USERNAME_LEN} characters"));
        }
        if self.email.chars().count() > MAX_EMAIL_LEN {
            return Err(format!("email must be at most {MAX_EMAIL_LEN} characters"));
        }

        Ok(User::new(self.username, self.email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(username: &str, email: &str) -> UserRequest {
        UserRequest {
            id: None,
            username: username.into(),
            email: email.into(),
        }
    }

    #[test]
    fn validate_preserves_fields_and_drops_id() {
        let user = UserRequest {
            id: Some(7),
            username: "  john_doe ".into(),
            email: " john@example.com".into(),
        }
        .validate()
        .unwrap();
        assert_eq!(user, User::new("  john_doe ", " john@example.com"));
    }

    #[test]
    fn validate_rejects_blank_fields() {
        assert!(req("   ", "a@example.com").validate().unwrap_err().contains("username"));
        assert!(req("a", "").validate().unwrap_err().contains("email"));
    }

    #[test]
    fn validate_rejects_oversized_fields() {
        let long = "x".repeat(51);
        assert!(req(&long, "a@example.com").validate().is_err());
        assert!(req(&"x".repeat(50), "a@example.com").validate().is_ok());
        assert!(req("a", &"y".repeat(101)).validate().is_err());
    }
}
