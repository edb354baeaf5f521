/// PostgreSQL store backend
///
/// Thin adapter from the store traits to the queries on the model types.
/// Uniqueness and cascades are enforced by the schema.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::store::{StoreResult, TaskStore, UserStore};
use crate::models::{
    task::{Task, TaskFilter},
    user::{CreateUser, UpdateUser, User},
};

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_username(&self.pool, username).await?)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn create(&self, data: CreateUser) -> StoreResult<User> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn update(&self, username: &str, data: UpdateUser) -> StoreResult<Option<User>> {
        Ok(User::update(&self.pool, username, data).await?)
    }

    async fn delete(&self, username: &str) -> StoreResult<bool> {
        Ok(User::delete(&self.pool, username).await?)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn list_by_owner(&self, username: &str, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        Ok(Task::list_by_owner(&self.pool, username, filter).await?)
    }

    async fn create(&self, task: &Task) -> StoreResult<Task> {
        Ok(Task::create(&self.pool, task).await?)
    }

    async fn update(&self, task: &Task) -> StoreResult<Option<Task>> {
        Ok(Task::update(&self.pool, task).await?)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Task::delete(&self.pool, id).await?)
    }
}
