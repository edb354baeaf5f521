/// Task endpoints
///
/// All routes require authentication and only ever expose the caller's own
/// tasks. Ownership is enforced by `tasklist_shared::auth::authorization`.
///
/// # Endpoints
///
/// - `GET /tasks?page_offset=1&title=milk` - List (50 per page, by deadline)
/// - `POST /tasks` - Create
/// - `PUT /tasks` - Replace (body carries the ID)
/// - `GET /tasks/:id` - Fetch one
/// - `DELETE /tasks/:id` - Delete
///
/// # Task JSON
///
/// ```json
/// {
///   "id": "6f1c...",
///   "title": "Buy milk",
///   "content": "2 litres",
///   "deadline": "2099-01-01T00:00:00",
///   "username": "alice"
/// }
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ValidatedJson, ValidatedQuery},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tasklist_shared::{
    auth::{authorization, middleware::CurrentUser},
    models::task::{deadline_format, NewTask, Task, TaskFilter},
};
use uuid::Uuid;
use validator::Validate;

/// Query parameters for listing tasks
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListTasksQuery {
    /// 1-indexed page (default 1)
    #[validate(range(min = 1, message = "page_offset must be at least 1"))]
    pub page_offset: Option<i64>,

    /// Case-insensitive title substring
    pub title: Option<String>,
}

impl From<ListTasksQuery> for TaskFilter {
    fn from(query: ListTasksQuery) -> Self {
        TaskFilter {
            page_offset: query.page_offset.unwrap_or(1),
            title: query.title,
        }
    }
}

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters"))]
    pub title: String,

    #[serde(default)]
    pub content: String,

    #[serde(with = "deadline_format")]
    pub deadline: DateTime<Utc>,

    /// Owner; must be the caller
    #[validate(length(min = 1, message = "Username must not be empty"))]
    pub username: String,
}

impl From<CreateTaskRequest> for NewTask {
    fn from(req: CreateTaskRequest) -> Self {
        NewTask {
            title: req.title,
            content: req.content,
            deadline: req.deadline,
            username: req.username,
        }
    }
}

/// Replace task request: the full record, ID included
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    pub id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters"))]
    pub title: String,

    #[serde(default)]
    pub content: String,

    #[serde(with = "deadline_format")]
    pub deadline: DateTime<Utc>,

    #[validate(length(min = 1, message = "Username must not be empty"))]
    pub username: String,
}

impl From<UpdateTaskRequest> for Task {
    fn from(req: UpdateTaskRequest) -> Self {
        Task {
            id: req.id,
            title: req.title,
            content: req.content,
            deadline: req.deadline,
            username: req.username,
        }
    }
}

/// Task IDs that aren't UUIDs can't exist
fn parse_task_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Task not found".to_string()))
}

/// List the caller's tasks
///
/// # Errors
///
/// - `403 Forbidden`: Not authenticated
/// - `422 Unprocessable Entity`: `page_offset` below 1 or not a number
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidatedQuery(query): ValidatedQuery<ListTasksQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let filter = TaskFilter::from(query);
    let tasks = authorization::list_tasks(state.stores.tasks.as_ref(), &user, &filter).await?;

    Ok(Json(tasks))
}

/// Create a task owned by the caller
///
/// # Errors
///
/// - `403 Forbidden`: Not authenticated, or `username` isn't the caller
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidatedJson(req): ValidatedJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = authorization::create_task(state.stores.tasks.as_ref(), &user, req.into()).await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Replace one of the caller's tasks
///
/// # Errors
///
/// - `403 Forbidden`: Not authenticated, or the task isn't the caller's
/// - `404 Not Found`: No task with this ID
/// - `422 Unprocessable Entity`: Validation failed
pub async fn update_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidatedJson(req): ValidatedJson<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    let task = authorization::update_task(state.stores.tasks.as_ref(), &user, req.into()).await?;

    Ok(Json(task))
}

/// Fetch one of the caller's tasks
///
/// # Errors
///
/// - `403 Forbidden`: Not authenticated, or the task isn't the caller's
/// - `404 Not Found`: No task with this ID
pub async fn get_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    let id = parse_task_id(&id)?;
    let task = authorization::get_task(state.stores.tasks.as_ref(), &user, id).await?;

    Ok(Json(task))
}

/// Delete one of the caller's tasks
///
/// # Errors
///
/// - `403 Forbidden`: Not authenticated, or the task isn't the caller's
/// - `404 Not Found`: No task with this ID
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_task_id(&id)?;
    authorization::delete_task(state.stores.tasks.as_ref(), &user, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
