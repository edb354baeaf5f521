/// In-memory store backend
///
/// Users and tasks live behind a single `RwLock`, so a rename or a withdrawal
/// updates both maps atomically, the same way the foreign-key cascades do in
/// PostgreSQL. Nothing survives a restart.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{StoreError, StoreResult, TaskStore, UserStore};
use crate::models::{
    task::{Task, TaskFilter, PAGE_SIZE},
    user::{CreateUser, UpdateUser, User},
};

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<String, User>,
    tasks: HashMap<Uuid, Task>,
}

impl MemoryState {
    fn email_taken(&self, email: &str, except: Option<&str>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.username.as_str()) != except)
    }
}

/// Store that keeps everything in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.users.get(username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn create(&self, data: CreateUser) -> StoreResult<User> {
        let mut state = self.state.write().await;

        if state.users.contains_key(&data.username) {
            return Err(StoreError::Duplicate { field: "username" });
        }
        if state.email_taken(&data.email, None) {
            return Err(StoreError::Duplicate { field: "email" });
        }

        let now = Utc::now();
        let user = User {
            username: data.username,
            email: data.email,
            salt: data.salt,
            hashed_password: data.hashed_password,
            created_at: now,
            updated_at: now,
        };

        state.users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    async fn update(&self, username: &str, data: UpdateUser) -> StoreResult<Option<User>> {
        let mut state = self.state.write().await;

        let Some(mut user) = state.users.get(username).cloned() else {
            return Ok(None);
        };

        if let Some(new_username) = data.username.as_deref() {
            if new_username != username && state.users.contains_key(new_username) {
                return Err(StoreError::Duplicate { field: "username" });
            }
        }
        if let Some(new_email) = data.email.as_deref() {
            if state.email_taken(new_email, Some(username)) {
                return Err(StoreError::Duplicate { field: "email" });
            }
        }

        if let Some(new_username) = data.username {
            user.username = new_username;
        }
        if let Some(email) = data.email {
            user.email = email;
        }
        if let Some(salt) = data.salt {
            user.salt = salt;
        }
        if let Some(hashed_password) = data.hashed_password {
            user.hashed_password = hashed_password;
        }
        user.updated_at = Utc::now();

        if user.username != username {
            state.users.remove(username);
            for task in state.tasks.values_mut().filter(|t| t.username == username) {
                task.username = user.username.clone();
            }
        }

        state.users.insert(user.username.clone(), user.clone());
        Ok(Some(user))
    }

    async fn delete(&self, username: &str) -> StoreResult<bool> {
        let mut state = self.state.write().await;

        if state.users.remove(username).is_none() {
            return Ok(false);
        }

        state.tasks.retain(|_, task| task.username != username);
        Ok(true)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.state.read().await.tasks.get(&id).cloned())
    }

    async fn list_by_owner(&self, username: &str, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        let state = self.state.read().await;

        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|t| t.username == username && filter.matches_title(&t.title))
            .cloned()
            .collect();

        tasks.sort_by(|a, b| (a.deadline, a.id).cmp(&(b.deadline, b.id)));

        Ok(tasks
            .into_iter()
            .skip(filter.offset() as usize)
            .take(PAGE_SIZE as usize)
            .collect())
    }

    async fn create(&self, task: &Task) -> StoreResult<Task> {
        let mut state = self.state.write().await;

        if state.tasks.contains_key(&task.id) {
            return Err(StoreError::Duplicate { field: "id" });
        }

        state.tasks.insert(task.id, task.clone());
        Ok(task.clone())
    }

    async fn update(&self, task: &Task) -> StoreResult<Option<Task>> {
        let mut state = self.state.write().await;

        match state.tasks.get_mut(&task.id) {
            Some(stored) => {
                *stored = task.clone();
                Ok(Some(task.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.state.write().await.tasks.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn new_user(username: &str, email: &str) -> CreateUser {
        CreateUser {
            username: username.to_string(),
            email: email.to_string(),
            salt: "salt".to_string(),
            hashed_password: "hash".to_string(),
        }
    }

    fn task_for(username: &str, title: &str, day: u32) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: String::new(),
            deadline: Utc.with_ymd_and_hms(2099, 1, day, 0, 0, 0).unwrap(),
            username: username.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicates() {
        let store = MemoryStore::new();
        UserStore::create(&store, new_user("alice", "a@example.com"))
            .await
            .unwrap();

        let err = UserStore::create(&store, new_user("alice", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { field: "username" }));

        let err = UserStore::create(&store, new_user("bob", "a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { field: "email" }));
    }

    #[tokio::test]
    async fn test_rename_moves_tasks() {
        let store = MemoryStore::new();
        UserStore::create(&store, new_user("alice", "a@example.com"))
            .await
            .unwrap();
        let task = TaskStore::create(&store, &task_for("alice", "t", 1))
            .await
            .unwrap();

        let update = UpdateUser {
            username: Some("alicia".to_string()),
            ..Default::default()
        };
        let user = UserStore::update(&store, "alice", update)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.username, "alicia");

        assert!(store.find_by_username("alice").await.unwrap().is_none());
        let moved = store.find_by_id(task.id).await.unwrap().unwrap();
        assert_eq!(moved.username, "alicia");
    }

    #[tokio::test]
    async fn test_update_keeps_own_email() {
        let store = MemoryStore::new();
        UserStore::create(&store, new_user("alice", "a@example.com"))
            .await
            .unwrap();

        let update = UpdateUser {
            email: Some("a@example.com".to_string()),
            ..Default::default()
        };
        assert!(UserStore::update(&store, "alice", update).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_orders_by_deadline_and_paginates() {
        let store = MemoryStore::new();
        for day in (1..=28).rev() {
            TaskStore::create(&store, &task_for("alice", "late", day))
                .await
                .unwrap();
        }
        let base = Utc.with_ymd_and_hms(2099, 2, 1, 0, 0, 0).unwrap();
        for i in 0..30 {
            let mut task = task_for("alice", "later", 1);
            task.deadline = base + Duration::hours(i);
            TaskStore::create(&store, &task).await.unwrap();
        }
        TaskStore::create(&store, &task_for("bob", "late", 1))
            .await
            .unwrap();

        let first = store
            .list_by_owner("alice", &TaskFilter::default())
            .await
            .unwrap();
        assert_eq!(first.len(), PAGE_SIZE as usize);
        assert!(first.windows(2).all(|w| w[0].deadline <= w[1].deadline));
        assert!(first.iter().all(|t| t.username == "alice"));

        let second = store
            .list_by_owner(
                "alice",
                &TaskFilter {
                    page_offset: 2,
                    title: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(second.len(), 8);
        assert!(first.last().unwrap().deadline <= second[0].deadline);
    }
}
