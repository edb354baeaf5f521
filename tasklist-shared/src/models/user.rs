/// User model and database operations
///
/// Users are keyed by their username. Both the username and the email address
/// are unique across all users. Passwords are never stored; each user has a
/// random salt and the Argon2id hash derived from it (see
/// [`crate::auth::password`]).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     username VARCHAR(64) PRIMARY KEY,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     salt VARCHAR(64) NOT NULL,
///     hashed_password VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use tasklist_shared::models::user::{User, CreateUser};
/// use tasklist_shared::auth::password::{generate_salt, hash_password};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let salt = generate_salt();
/// let hashed_password = hash_password(&salt, "hunter2")?;
///
/// let user = User::create(&pool, CreateUser {
///     username: "alice".to_string(),
///     email: "alice@example.com".to_string(),
///     salt: salt.to_string(),
///     hashed_password,
/// }).await?;
///
/// let found = User::find_by_email(&pool, "alice@example.com").await?;
/// assert_eq!(found.map(|u| u.username), Some(user.username));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// User model representing a user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique username, also the primary key
    pub username: String,

    /// Email address, unique across all users
    pub email: String,

    /// Per-user random salt (B64, as produced by `generate_salt`)
    #[serde(skip_serializing)]
    pub salt: String,

    /// Argon2id PHC string derived from `salt` and the plaintext password
    #[serde(skip_serializing)]
    pub hashed_password: String,

    /// When the user registered
    pub created_at: DateTime<Utc>,

    /// When the profile was last changed
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub salt: String,
    /// Argon2id hash (NOT the plaintext password)
    pub hashed_password: String,
}

/// Input for updating an existing user
///
/// All fields are optional. Only non-None fields are written. A new password
/// always comes with a new salt, so `salt` and `hashed_password` are expected
/// to be set together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    /// New username (tasks follow the rename)
    pub username: Option<String>,

    /// New email address
    pub email: Option<String>,

    /// New salt
    pub salt: Option<String>,

    /// New password hash
    pub hashed_password: Option<String>,
}

impl UpdateUser {
    /// Returns true when no field would change
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.salt.is_none()
            && self.hashed_password.is_none()
    }
}

const USER_COLUMNS: &str = "username, email, salt, hashed_password, created_at, updated_at";

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the username or email is already taken (unique
    /// constraint violation) or the database is unreachable.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (username, email, salt, hashed_password) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.username)
            .bind(data.email)
            .bind(data.salt)
            .bind(data.hashed_password)
            .fetch_one(pool)
            .await
    }

    /// Finds a user by username
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email address
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Updates an existing user
    ///
    /// Only non-None fields in `data` are written and `updated_at` is bumped.
    /// Renaming a user cascades to the `tasks.username` foreign key.
    ///
    /// # Returns
    ///
    /// The updated user, or None if no user has `username`
    pub async fn update(
        pool: &PgPool,
        username: &str,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        for (column, present) in [
            ("username", data.username.is_some()),
            ("email", data.email.is_some()),
            ("salt", data.salt.is_some()),
            ("hashed_password", data.hashed_password.is_some()),
        ] {
            if present {
                bind_count += 1;
                query.push_str(&format!(", {column} = ${bind_count}"));
            }
        }

        query.push_str(&format!(" WHERE username = $1 RETURNING {USER_COLUMNS}"));

        let mut q = sqlx::query_as::<_, User>(&query).bind(username);

        for value in [data.username, data.email, data.salt, data.hashed_password]
            .into_iter()
            .flatten()
        {
            q = q.bind(value);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a user
    ///
    /// The user's tasks are removed with them (`ON DELETE CASCADE`).
    ///
    /// # Returns
    ///
    /// True if the user was deleted, false if it didn't exist
    pub async fn delete(pool: &PgPool, username: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_user_default_is_empty() {
        let update = UpdateUser::default();
        assert!(update.is_empty());

        let update = UpdateUser {
            email: Some("new@example.com".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_user_serialization_hides_credentials() {
        let user = User {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            salt: "c2FsdHNhbHRzYWx0".to_string(),
            hashed_password: "$argon2id$...".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["username"], "alice");
        assert!(json.get("salt").is_none());
        assert!(json.get("hashed_password").is_none());
    }
}
