/// Task access control
///
/// Every task operation an authenticated user performs goes through this
/// module. The rule is simple: a user may only see and touch tasks whose
/// `username` is their own, and may only create or rewrite tasks that
/// declare them as owner.
///
/// # Order of checks
///
/// For operations on an existing task the lookup happens first, so a
/// missing task is `NotFound` for everybody and a foreign one is
/// `NotOwner`.
///
/// # Example
///
/// ```no_run
/// # use tasklist_shared::auth::authorization::get_task;
/// # use tasklist_shared::db::store::TaskStore;
/// # use tasklist_shared::models::user::User;
/// # use uuid::Uuid;
/// # async fn example(store: &dyn TaskStore, user: &User, id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let task = get_task(store, user, id).await?;
/// assert_eq!(task.username, user.username);
/// # Ok(())
/// # }
/// ```

use tracing::{info, warn};
use uuid::Uuid;

use crate::db::store::{StoreError, TaskStore};
use crate::models::{
    task::{NewTask, Task, TaskFilter},
    user::User,
};

/// Error type for task access checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller doesn't own the task (or declares someone else as owner)
    #[error("Not authorized to access this task")]
    NotOwner,

    /// No task with this ID
    #[error("Task {0} not found")]
    NotFound(Uuid),

    /// Task store failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Checks that `user` owns `task`
pub fn authorize_task_owner(user: &User, task: &Task) -> Result<(), AuthzError> {
    if task.username != user.username {
        warn!(
            username = %user.username,
            task_id = %task.id,
            "Rejected access to another user's task"
        );
        return Err(AuthzError::NotOwner);
    }

    Ok(())
}

fn require_declared_owner(user: &User, declared: &str) -> Result<(), AuthzError> {
    if declared != user.username {
        warn!(
            username = %user.username,
            declared_owner = %declared,
            "Rejected task declaring another owner"
        );
        return Err(AuthzError::NotOwner);
    }

    Ok(())
}

async fn find_owned(store: &dyn TaskStore, user: &User, id: Uuid) -> Result<Task, AuthzError> {
    let task = store.find_by_id(id).await?.ok_or(AuthzError::NotFound(id))?;
    authorize_task_owner(user, &task)?;
    Ok(task)
}

/// Creates a task owned by the caller
///
/// # Errors
///
/// `NotOwner` if `new_task.username` isn't the caller
pub async fn create_task(
    store: &dyn TaskStore,
    user: &User,
    new_task: NewTask,
) -> Result<Task, AuthzError> {
    require_declared_owner(user, &new_task.username)?;

    let task = store.create(&new_task.into_task()).await?;

    info!(username = %user.username, task_id = %task.id, "Task created");
    Ok(task)
}

/// Fetches one of the caller's tasks
///
/// # Errors
///
/// `NotFound` if no task has `id`, `NotOwner` if it belongs to someone else
pub async fn get_task(store: &dyn TaskStore, user: &User, id: Uuid) -> Result<Task, AuthzError> {
    find_owned(store, user, id).await
}

/// Replaces one of the caller's tasks with `task`
///
/// The replacement must still be owned by the caller; tasks can't be handed
/// over to another user.
///
/// # Errors
///
/// - `NotOwner` if `task.username` isn't the caller, or the stored task
///   belongs to someone else
/// - `NotFound` if no task has `task.id`
pub async fn update_task(store: &dyn TaskStore, user: &User, task: Task) -> Result<Task, AuthzError> {
    require_declared_owner(user, &task.username)?;
    find_owned(store, user, task.id).await?;

    let updated = store
        .update(&task)
        .await?
        .ok_or(AuthzError::NotFound(task.id))?;

    info!(username = %user.username, task_id = %updated.id, "Task updated");
    Ok(updated)
}

/// Deletes one of the caller's tasks
///
/// # Errors
///
/// `NotFound` if no task has `id`, `NotOwner` if it belongs to someone else
pub async fn delete_task(store: &dyn TaskStore, user: &User, id: Uuid) -> Result<(), AuthzError> {
    find_owned(store, user, id).await?;

    if !store.delete(id).await? {
        return Err(AuthzError::NotFound(id));
    }

    info!(username = %user.username, task_id = %id, "Task deleted");
    Ok(())
}

/// Lists one page of the caller's tasks
pub async fn list_tasks(
    store: &dyn TaskStore,
    user: &User,
    filter: &TaskFilter,
) -> Result<Vec<Task>, AuthzError> {
    Ok(store.list_by_owner(&user.username, filter).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn user(username: &str) -> User {
        User {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            salt: "salt".to_string(),
            hashed_password: "hash".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn new_task(owner: &str) -> NewTask {
        NewTask {
            title: "t".to_string(),
            content: "c".to_string(),
            deadline: Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap(),
            username: owner.to_string(),
        }
    }

    #[test]
    fn test_authorize_task_owner() {
        let alice = user("alice");
        let task = new_task("alice").into_task();

        assert!(authorize_task_owner(&alice, &task).is_ok());
        assert!(matches!(
            authorize_task_owner(&user("bob"), &task),
            Err(AuthzError::NotOwner)
        ));
    }

    #[tokio::test]
    async fn test_create_requires_declared_owner() {
        let store = MemoryStore::new();

        let err = create_task(&store, &user("alice"), new_task("bob"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::NotOwner));

        let task = create_task(&store, &user("alice"), new_task("alice"))
            .await
            .unwrap();
        assert_eq!(task.username, "alice");
    }

    #[tokio::test]
    async fn test_foreign_task_is_forbidden() {
        let store = MemoryStore::new();
        let (alice, bob) = (user("alice"), user("bob"));
        let task = create_task(&store, &alice, new_task("alice")).await.unwrap();

        assert!(matches!(
            get_task(&store, &bob, task.id).await,
            Err(AuthzError::NotOwner)
        ));
        assert!(matches!(
            delete_task(&store, &bob, task.id).await,
            Err(AuthzError::NotOwner)
        ));

        let mut hijack = task.clone();
        hijack.username = "bob".to_string();
        assert!(matches!(
            update_task(&store, &bob, hijack).await,
            Err(AuthzError::NotOwner)
        ));

        assert_eq!(get_task(&store, &alice, task.id).await.unwrap(), task);
    }

    #[tokio::test]
    async fn test_missing_task_is_not_found() {
        let store = MemoryStore::new();
        let alice = user("alice");
        let id = Uuid::new_v4();

        assert!(matches!(
            get_task(&store, &alice, id).await,
            Err(AuthzError::NotFound(_))
        ));
        assert!(matches!(
            delete_task(&store, &alice, id).await,
            Err(AuthzError::NotFound(_))
        ));

        let mut task = new_task("alice").into_task();
        task.id = id;
        assert!(matches!(
            update_task(&store, &alice, task).await,
            Err(AuthzError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete_own_task() {
        let store = MemoryStore::new();
        let alice = user("alice");
        let mut task = create_task(&store, &alice, new_task("alice")).await.unwrap();

        task.title = "renamed".to_string();
        let updated = update_task(&store, &alice, task.clone()).await.unwrap();
        assert_eq!(updated.title, "renamed");

        delete_task(&store, &alice, task.id).await.unwrap();
        assert!(matches!(
            delete_task(&store, &alice, task.id).await,
            Err(AuthzError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_only_returns_own_tasks() {
        let store = MemoryStore::new();
        let (alice, bob) = (user("alice"), user("bob"));
        create_task(&store, &alice, new_task("alice")).await.unwrap();
        create_task(&store, &bob, new_task("bob")).await.unwrap();

        let tasks = list_tasks(&store, &alice, &TaskFilter::default())
            .await
            .unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].username, "alice");
    }
}
