use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::User;

/// Keyed user storage with username and email lookups.
///
/// Absence is never an error: lookups return `Ok(None)` and deletes return
/// `Ok(false)`. `Err` is reserved for backend faults.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_all(&self) -> anyhow::Result<Vec<User>>;
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn exists_by_username(&self, username: &str) -> anyhow::Result<bool>;
    /// Inserts when `user.id` is `None` (assigning a fresh id), otherwise
    /// overwrites the whole record stored under that id. Ids are never
    /// handed out twice, even after deletes.
    async fn save(&self, user: User) -> anyhow::Result<User>;
    /// Overwrites `username` and `email` of an existing record; `None` when
    /// no record has that id. Never recreates a deleted row.
    async fn update(&self, id: i64, username: &str, email: &str) -> anyhow::Result<Option<User>>;
    async fn delete_by_id(&self, id: i64) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_all(&self) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email
            FROM users
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email
            FROM users
            WHERE username = $1
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .context("find user by username")?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email
            FROM users
            WHERE email = $1
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn exists_by_username(&self, username: &str) -> anyhow::Result<bool> {
        let exists: bool =
            sqlx::query_scalar(r#"SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)"#)
                .bind(username)
                .fetch_one(&self.db)
                .await
                .context("check username")?;
        Ok(exists)
    }

    async fn save(&self, user: User) -> anyhow::Result<User> {
        let Some(id) = user.id else {
            let created = sqlx::query_as::<_, User>(
                r#"
                INSERT INTO users (username, email)
                VALUES ($1, $2)
                RETURNING id, username, email
                "#,
            )
            .bind(&user.username)
            .bind(&user.email)
            .fetch_one(&self.db)
            .await
            .context("insert user")?;
            return Ok(created);
        };

        if let Some(updated) = self.update(id, &user.username, &user.email).await? {
            return Ok(updated);
        }

        let mut tx = self.db.begin().await.context("begin tx")?;
        let saved = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
               SET username = EXCLUDED.username,
                   email = EXCLUDED.email
            RETURNING id, username, email
            "#,
        )
        .bind(id)
        .bind(&user.username)
        .bind(&user.email)
        .fetch_one(&mut *tx)
        .await
        .context("insert user with id")?;

        // only ever move the sequence forward
        sqlx::query(
            r#"
            SELECT setval(pg_get_serial_sequence('users', 'id'),
                          GREATEST($1, (SELECT last_value FROM users_id_seq)))
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("advance user id sequence")?;
        tx.commit().await.context("commit tx")?;

        Ok(saved)
    }

    async fn update(&self, id: i64, username: &str, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET username = $2,
                   email = $3
             WHERE id = $1
            RETURNING id, username, email
            "#,
        )
        .bind(id)
        .bind(username)
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("update user")?;
        Ok(user)
    }

    async fn delete_by_id(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete user")?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{distributions::Alphanumeric, Rng};
    use sqlx::postgres::PgPoolOptions;

    /// Connects to `TEST_DATABASE_URL`; `None` skips the Postgres tests.
    async fn store() -> Option<PgUserStore> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let db = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("connect to test database");
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .expect("run migrations");
        Some(PgUserStore::new(db))
    }

    fn unique(prefix: &str) -> String {
        let tag: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(10)
            .map(char::from)
            .collect();
        format!("{prefix}_{tag}")
    }

    #[tokio::test]
    async fn postgres_store_contract() {
        let Some(store) = store().await else {
            eprintln!("TEST_DATABASE_URL not set; skipping");
            return;
        };

        // insert assigns an id
        let name = unique("pg_user");
        let email = format!("{name}@example.com");
        let a = store.save(User::new(&name, &email)).await.unwrap();
        let a_id = a.id.expect("id assigned");
        assert_eq!(store.find_by_id(a_id).await.unwrap(), Some(a.clone()));

        // lookups return the lowest id among duplicates
        let dup = store.save(User::new(&name, &email)).await.unwrap();
        assert!(dup.id.unwrap() > a_id);
        assert_eq!(store.find_by_username(&name).await.unwrap().unwrap().id, Some(a_id));
        assert_eq!(store.find_by_email(&email).await.unwrap().unwrap().id, Some(a_id));
        assert!(store.exists_by_username(&name).await.unwrap());
        assert!(!store.exists_by_username(&unique("absent")).await.unwrap());

        // save with id overwrites
        let renamed = unique("pg_renamed");
        let saved = store
            .save(User {
                id: Some(a_id),
                username: renamed.clone(),
                email: "renamed@example.com".into(),
            })
            .await
            .unwrap();
        assert_eq!(saved.id, Some(a_id));
        let stored = store.find_by_id(a_id).await.unwrap().unwrap();
        assert_eq!(stored.username, renamed);
        assert_eq!(stored.email, "renamed@example.com");

        // delete is true then false
        let dup_id = dup.id.unwrap();
        assert!(store.delete_by_id(dup_id).await.unwrap());
        assert!(!store.delete_by_id(dup_id).await.unwrap());
        assert!(store.find_by_id(dup_id).await.unwrap().is_none());

        // update of a deleted row does not bring it back
        assert!(store.update(dup_id, "ghost", "ghost@example.com").await.unwrap().is_none());
        assert!(store.find_by_id(dup_id).await.unwrap().is_none());

        // an update after deleting the newest row must not recycle its id
        store
            .save(User {
                id: Some(a_id),
                username: renamed.clone(),
                email: "again@example.com".into(),
            })
            .await
            .unwrap();
        let c = store.save(User::new(unique("pg_next"), "next@example.com")).await.unwrap();
        assert!(c.id.unwrap() > dup_id, "deleted id {dup_id} was handed out again");

        store.delete_by_id(a_id).await.unwrap();
        store.delete_by_id(c.id.unwrap()).await.unwrap();
    }
}
