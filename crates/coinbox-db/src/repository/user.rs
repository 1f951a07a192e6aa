//! # User Repository
//!
//! Operator accounts. Passwords arrive here already hashed; this module
//! never sees plaintext.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// A stored operator account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,

    /// Argon2 PHC string. Never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Looks up an operator by login email.
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, created_at, updated_at
            FROM users
            WHERE email = ?1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, created_at, updated_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Creates a new operator.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - email already registered
    pub async fn insert(
        &self,
        email: &str,
        name: Option<&str>,
        password_hash: &str,
    ) -> DbResult<User> {
        debug!(email = %email, "Inserting user");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (email, name, password_hash, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            "#,
        )
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(User {
            id: result.last_insert_rowid(),
            email: email.to_string(),
            name: name.map(str::to_string),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns the operator with `email`, creating it if absent.
    ///
    /// An existing account is left exactly as it is (its password is not
    /// reset). The flag is `true` when a new row was written.
    pub async fn ensure(
        &self,
        email: &str,
        name: Option<&str>,
        password_hash: &str,
    ) -> DbResult<(User, bool)> {
        if let Some(existing) = self.get_by_email(email).await? {
            return Ok((existing, false));
        }

        match self.insert(email, name, password_hash).await {
            Ok(user) => Ok((user, true)),
            // Lost a race with another seeder
            Err(DbError::UniqueViolation { .. }) => self
                .get_by_email(email)
                .await?
                .map(|user| (user, false))
                .ok_or_else(|| DbError::not_found("User", email)),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::Database;

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = Database::in_memory().await.unwrap();
        let users = db.users();

        let user = users
            .insert("ops@example.com", Some("Ops"), "$argon2id$fake")
            .await
            .unwrap();

        let by_email = users.get_by_email("ops@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert_eq!(by_email.name.as_deref(), Some("Ops"));

        let by_id = users.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "ops@example.com");

        assert!(users.get_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = Database::in_memory().await.unwrap();
        let users = db.users();

        users.insert("a@example.com", None, "h1").await.unwrap();
        let err = users.insert("a@example.com", None, "h2").await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_ensure_keeps_existing_account() {
        let db = Database::in_memory().await.unwrap();
        let users = db.users();

        let (first, created) = users.ensure("admin@example.com", None, "h1").await.unwrap();
        assert!(created);

        let (second, created) = users.ensure("admin@example.com", None, "h2").await.unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.password_hash, "h1");
        let stored = users.get_by_email("admin@example.com").await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "h1");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = super::User {
            id: 1,
            email: "a@example.com".to_string(),
            name: None,
            password_hash: "secret".to_string(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["email"], "a@example.com");
    }
}
