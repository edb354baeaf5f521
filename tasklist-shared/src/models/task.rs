/// Task model and database operations
///
/// A task is a titled to-do entry with a deadline, owned by exactly one user.
/// Only the owner may read, change or delete it; those checks live in
/// [`crate::auth::authorization`], this module only persists rows.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     username VARCHAR(64) NOT NULL
///         REFERENCES users(username) ON UPDATE CASCADE ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     content TEXT NOT NULL DEFAULT '',
///     deadline TIMESTAMPTZ NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Deadlines
///
/// Deadlines are stored in UTC with whole-second precision. On the wire they
/// are written as `YYYY-MM-DDTHH:MM:SS` (UTC, no offset). Input may be either
/// that naive form (read as UTC) or any RFC 3339 timestamp.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Number of tasks returned per page when listing
pub const PAGE_SIZE: i64 = 50;

/// Task model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID, generated at creation
    pub id: Uuid,

    /// Short title, never empty
    pub title: String,

    /// Free-form body
    #[serde(default)]
    pub content: String,

    /// When the task is due
    #[serde(with = "deadline_format")]
    pub deadline: DateTime<Utc>,

    /// Owning user
    pub username: String,
}

/// Input for creating a task; the ID is assigned by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,

    #[serde(default)]
    pub content: String,

    #[serde(with = "deadline_format")]
    pub deadline: DateTime<Utc>,

    /// Declared owner; must match the caller
    pub username: String,
}

impl NewTask {
    /// Turns the input into a task with a freshly generated ID
    pub fn into_task(self) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: self.title,
            content: self.content,
            deadline: self.deadline,
            username: self.username,
        }
    }
}

/// Listing parameters: which page, and an optional title filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    /// 1-indexed page number
    pub page_offset: i64,

    /// Case-insensitive substring the title must contain
    pub title: Option<String>,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            page_offset: 1,
            title: None,
        }
    }
}

impl TaskFilter {
    /// Number of rows to skip for this page
    ///
    /// Saturates for absurd page numbers, which then simply come back empty.
    pub fn offset(&self) -> i64 {
        (self.page_offset.max(1) - 1).saturating_mul(PAGE_SIZE)
    }

    /// The title filter as an `ILIKE` pattern with wildcards escaped
    ///
    /// Returns None when there is no filter (or it is empty).
    pub fn title_pattern(&self) -> Option<String> {
        let title = self.title.as_deref().filter(|t| !t.is_empty())?;

        let mut pattern = String::with_capacity(title.len() + 2);
        pattern.push('%');
        for c in title.chars() {
            if matches!(c, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');

        Some(pattern)
    }

    /// Whether `title` passes the filter, matching `title_pattern` semantics
    pub fn matches_title(&self, title: &str) -> bool {
        match self.title.as_deref().filter(|t| !t.is_empty()) {
            Some(needle) => title.to_lowercase().contains(&needle.to_lowercase()),
            None => true,
        }
    }
}

const TASK_COLUMNS: &str = "id, title, content, deadline, username";

impl Task {
    /// Inserts a task exactly as given (ID included)
    ///
    /// # Errors
    ///
    /// Returns an error if the ID already exists, the owner doesn't exist
    /// (foreign key violation) or the database is unreachable.
    pub async fn create(pool: &PgPool, task: &Task) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (id, title, content, deadline, username) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {TASK_COLUMNS}"
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(task.id)
            .bind(&task.title)
            .bind(&task.content)
            .bind(task.deadline)
            .bind(&task.username)
            .fetch_one(pool)
            .await
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists one page of a user's tasks, ordered by deadline then ID
    pub async fn list_by_owner(
        pool: &PgPool,
        username: &str,
        filter: &TaskFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE username = $1 AND ($2::TEXT IS NULL OR title ILIKE $2) \
             ORDER BY deadline ASC, id ASC \
             LIMIT $3 OFFSET $4"
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(username)
            .bind(filter.title_pattern())
            .bind(PAGE_SIZE)
            .bind(filter.offset())
            .fetch_all(pool)
            .await
    }

    /// Replaces every mutable column of the task with ID `task.id`
    ///
    /// # Returns
    ///
    /// The stored task, or None if no row has that ID
    pub async fn update(pool: &PgPool, task: &Task) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks \
             SET title = $2, content = $3, deadline = $4, username = $5, updated_at = NOW() \
             WHERE id = $1 RETURNING {TASK_COLUMNS}"
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(task.id)
            .bind(&task.title)
            .bind(&task.content)
            .bind(task.deadline)
            .bind(&task.username)
            .fetch_optional(pool)
            .await
    }

    /// Deletes a task
    ///
    /// # Returns
    ///
    /// True if the task was deleted, false if it didn't exist
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Serde adapter for task deadlines
pub mod deadline_format {
    use super::*;
    use serde::{de, Deserializer, Serializer};

    /// Wire format for deadlines (UTC, no offset)
    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    /// Parses an RFC 3339 or naive (UTC) timestamp, dropping sub-seconds
    pub fn parse(value: &str) -> Option<DateTime<Utc>> {
        let parsed = DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| value.parse::<NaiveDateTime>().ok().map(|n| n.and_utc()))?;

        Some(parsed.trunc_subsecs(0))
    }

    pub fn serialize<S>(deadline: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&deadline.format(FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| {
            de::Error::custom(format!(
                "invalid deadline '{raw}', expected YYYY-MM-DDTHH:MM:SS or RFC 3339"
            ))
        })
    }
}
