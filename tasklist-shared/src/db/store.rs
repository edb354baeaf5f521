/// Store abstraction
///
/// Handlers never touch a database directly. They receive a [`Stores`] handle
/// holding one [`UserStore`] (the credential store) and one [`TaskStore`],
/// built once at startup from a [`DatabaseConfig`] and injected through the
/// application state.
///
/// # Backends
///
/// - [`StoreBackend::Postgres`]: sqlx pool, migrations run on connect
/// - [`StoreBackend::Memory`]: process-local maps, for tests and demos
///
/// # Example
///
/// ```
/// use tasklist_shared::db::pool::DatabaseConfig;
/// use tasklist_shared::db::store::Stores;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let stores = Stores::connect(&DatabaseConfig::memory()).await?;
/// assert!(stores.users.find_by_username("nobody").await?.is_none());
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::{fmt, str::FromStr, sync::Arc};
use tracing::info;
use uuid::Uuid;

use super::{
    memory::MemoryStore,
    migrations::run_migrations,
    pool::{close_pool, create_pool, health_check, DatabaseConfig},
    postgres::PgStore,
};
use crate::models::{
    task::{Task, TaskFilter},
    user::{CreateUser, UpdateUser, User},
};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique column already holds this value
    #[error("{field} is already taken")]
    Duplicate { field: &'static str },

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Schema migration failed at startup
    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let field = match db_err.constraint() {
                    Some(c) if c.contains("email") => "email",
                    Some(c) if c.starts_with("users") => "username",
                    _ => "id",
                };
                return StoreError::Duplicate { field };
            }
        }

        StoreError::Database(err)
    }
}

/// Which store implementation to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Postgres => "postgres",
            StoreBackend::Memory => "memory",
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{other}'")),
        }
    }
}

/// Credential store: persists users
///
/// `create` and `update` enforce uniqueness of username and email and fail
/// with [`StoreError::Duplicate`] on a collision. Renaming a user carries
/// their tasks along; deleting a user deletes their tasks.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn create(&self, data: CreateUser) -> StoreResult<User>;

    /// Returns None if no user has `username`
    async fn update(&self, username: &str, data: UpdateUser) -> StoreResult<Option<User>>;

    /// Returns false if no user has `username`
    async fn delete(&self, username: &str) -> StoreResult<bool>;
}

/// Task store: persists tasks
///
/// The store does not check ownership; callers go through
/// [`crate::auth::authorization`].
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// One page of `username`'s tasks, ordered by deadline then ID
    async fn list_by_owner(&self, username: &str, filter: &TaskFilter) -> StoreResult<Vec<Task>>;

    async fn create(&self, task: &Task) -> StoreResult<Task>;

    /// Full replace; returns None if no task has `task.id`
    async fn update(&self, task: &Task) -> StoreResult<Option<Task>>;

    /// Returns false if no task has `id`
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

/// Handle to the configured stores, cheap to clone
#[derive(Clone)]
pub struct Stores {
    /// Credential store
    pub users: Arc<dyn UserStore>,

    /// Task store
    pub tasks: Arc<dyn TaskStore>,

    backend: StoreBackend,
    pool: Option<PgPool>,
}

impl Stores {
    /// Builds the stores described by `config`
    ///
    /// For PostgreSQL this creates the pool and runs pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable or a migration fails.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        info!(backend = %config.backend, "Connecting stores");

        match config.backend {
            StoreBackend::Postgres => {
                let pool = create_pool(config).await?;
                run_migrations(&pool).await?;
                Ok(Self::postgres(pool))
            }
            StoreBackend::Memory => Ok(Self::memory()),
        }
    }

    /// Stores backed by an existing PostgreSQL pool
    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool.clone()));

        Self {
            users: store.clone(),
            tasks: store,
            backend: StoreBackend::Postgres,
            pool: Some(pool),
        }
    }

    /// Fresh, empty in-memory stores
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());

        Self {
            users: store.clone(),
            tasks: store,
            backend: StoreBackend::Memory,
            pool: None,
        }
    }

    pub fn backend(&self) -> StoreBackend {
        self.backend
    }

    /// Checks that the backing database answers
    pub async fn health_check(&self) -> StoreResult<()> {
        match &self.pool {
            Some(pool) => Ok(health_check(pool).await?),
            None => Ok(()),
        }
    }

    /// Releases database connections; a no-op for the memory backend
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            close_pool(pool.clone()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_from_str() {
        assert_eq!("postgres".parse::<StoreBackend>(), Ok(StoreBackend::Postgres));
        assert_eq!("PostgreSQL".parse::<StoreBackend>(), Ok(StoreBackend::Postgres));
        assert_eq!(" memory ".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("mysql".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_duplicate_error_message() {
        let err = StoreError::Duplicate { field: "email" };
        assert_eq!(err.to_string(), "email is already taken");
    }

    #[tokio::test]
    async fn test_connect_memory_backend() {
        let stores = Stores::connect(&DatabaseConfig::memory()).await.unwrap();
        assert_eq!(stores.backend(), StoreBackend::Memory);
        assert!(stores.health_check().await.is_ok());
        stores.close().await;
    }
}
