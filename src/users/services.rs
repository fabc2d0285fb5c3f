use std::sync::Arc;

use tracing::{debug, info};

use super::repo::UserStore;
use super::repo_types::User;

/// Business operations over [`UserStore`]. Absence is reported as
/// `None`/`false`; only storage faults surface as `Err`.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn get_all_users(&self) -> anyhow::Result<Vec<User>> {
        self.store.find_all().await
    }

    pub async fn get_user_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        self.store.find_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        self.store.find_by_username(username).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        self.store.find_by_email(email).await
    }

    pub async fn username_exists(&self, username: &str) -> anyhow::Result<bool> {
        self.store.exists_by_username(username).await
    }

    /// Duplicate usernames are accepted; callers wanting uniqueness check
    /// [`Self::username_exists`] first.
    pub async fn create_user(&self, user: User) -> anyhow::Result<User> {
        let created = self.store.save(User { id: None, ..user }).await?;
        info!(user_id = ?created.id, username = %created.username, "user created");
        Ok(created)
    }

    /// Overwrites `username` and `email` of the record under `id`; the id
    /// itself is never taken from `details`.
    pub async fn update_user(&self, id: i64, details: User) -> anyhow::Result<Option<User>> {
        let updated = self
            .store
            .update(id, &details.username, &details.email)
            .await?;
        match &updated {
            Some(_) => info!(user_id = id, "user updated"),
            None => debug!(user_id = id, "update skipped, user not found"),
        }
        Ok(updated)
    }

    pub async fn delete_user(&self, id: i64) -> anyhow::Result<bool> {
        if self.store.find_by_id(id).await?.is_none() {
            debug!(user_id = id, "delete skipped, user not found");
            return Ok(false);
        }
        let deleted = self.store.delete_by_id(id).await?;
        info!(user_id = id, deleted, "user deleted");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::memory::InMemoryUserStore;

    fn service() -> UserService {
        UserService::new(Arc::new(InMemoryUserStore::new()))
    }

    #[tokio::test]
    async fn absent_ids_report_not_found() {
        let svc = service();
        assert!(svc.get_user_by_id(99999).await.unwrap().is_none());
        assert!(svc
            .update_user(99999, User::new("a", "a@example.com"))
            .await
            .unwrap()
            .is_none());
        assert!(!svc.delete_user(99999).await.unwrap());
        assert!(svc.get_all_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_then_get_returns_same_fields() {
        let svc = service();
        let input = User::new("john_doe", "john@example.com");
        let created = svc.create_user(input.clone()).await.unwrap();
        let id = created.id.expect("id assigned");

        let fetched = svc.get_user_by_id(id).await.unwrap().unwrap();
        assert_eq!(fetched, User { id: Some(id), ..input });
    }

    #[tokio::test]
    async fn create_ignores_caller_supplied_id() {
        let svc = service();
        let first = svc.create_user(User::new("a", "a@example.com")).await.unwrap();
        let second = svc
            .create_user(User {
                id: first.id,
                username: "b".into(),
                email: "b@example.com".into(),
            })
            .await
            .unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(svc.get_all_users().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_overwrites_username_and_email_only() {
        let svc = service();
        let created = svc.create_user(User::new("old", "old@example.com")).await.unwrap();
        let id = created.id.unwrap();

        let details = User {
            id: Some(12345),
            username: "updated_user".into(),
            email: "updated@example.com".into(),
        };
        let updated = svc.update_user(id, details).await.unwrap().unwrap();
        assert_eq!(updated.id, Some(id));

        let fetched = svc.get_user_by_id(id).await.unwrap().unwrap();
        assert_eq!(fetched.username, "updated_user");
        assert_eq!(fetched.email, "updated@example.com");
        assert!(svc.get_user_by_id(12345).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_is_true_then_false() {
        let svc = service();
        let id = svc
            .create_user(User::new("gone", "gone@example.com"))
            .await
            .unwrap()
            .id
            .unwrap();
        assert!(svc.delete_user(id).await.unwrap());
        assert!(!svc.delete_user(id).await.unwrap());
        assert!(svc.get_user_by_id(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_after_delete_does_not_resurrect() {
        let svc = service();
        let id = svc
            .create_user(User::new("gone", "gone@example.com"))
            .await
            .unwrap()
            .id
            .unwrap();
        assert!(svc.delete_user(id).await.unwrap());

        let updated = svc
            .update_user(id, User::new("back", "back@example.com"))
            .await
            .unwrap();
        assert!(updated.is_none());
        assert!(svc.get_user_by_id(id).await.unwrap().is_none());
        assert!(svc.get_all_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_usernames_are_allowed() {
        let svc = service();
        svc.create_user(User::new("twin", "one@example.com")).await.unwrap();
        assert!(svc.username_exists("twin").await.unwrap());
        svc.create_user(User::new("twin", "two@example.com")).await.unwrap();

        assert_eq!(svc.get_all_users().await.unwrap().len(), 2);
        let first = svc.get_user_by_username("twin").await.unwrap().unwrap();
        assert_eq!(first.email, "one@example.com");
        let by_email = svc.get_user_by_email("two@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.username, "twin");
    }
}
