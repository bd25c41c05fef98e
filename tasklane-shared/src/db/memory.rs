/// In-memory store
///
/// Used when `DATABASE_URL=memory://` and by the test suites. A transaction
/// takes the store-wide lock for its whole lifetime and works on a private
/// copy of the state; `commit` publishes the copy, dropping discards it. This
/// gives serializable isolation at the cost of concurrency, which is fine for
/// the workloads it is meant for.
///
/// Constraints enforced on write:
///
/// - unique `users.username` and `users.email`
/// - `tasks.user_id` references an existing user

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::store::{Store, StoreError, Transaction};
use crate::models::{
    task::{CreateTask, Task, UpdateTask},
    user::{CreateUser, User},
};

#[derive(Debug, Clone)]
struct MemoryState {
    users: BTreeMap<i64, User>,
    tasks: BTreeMap<i64, Task>,
    next_user_id: i64,
    next_task_id: i64,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            users: BTreeMap::new(),
            tasks: BTreeMap::new(),
            next_user_id: 1,
            next_task_id: 1,
        }
    }
}

/// Process-local store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, staged }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Open in-memory transaction
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn find_user_by_id(&mut self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.staged.users.get(&id).cloned())
    }

    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .staged
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .staged
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn insert_user(&mut self, data: CreateUser) -> Result<User, StoreError> {
        for existing in self.staged.users.values() {
            if existing.username == data.username {
                return Err(StoreError::UniqueViolation {
                    field: "username".to_string(),
                });
            }
            if existing.email == data.email {
                return Err(StoreError::UniqueViolation {
                    field: "email".to_string(),
                });
            }
        }

        let id = self.staged.next_user_id;
        self.staged.next_user_id += 1;

        let user = User {
            id,
            username: data.username,
            email: data.email,
            password_hash: data.password_hash,
            created_at: Utc::now(),
        };
        self.staged.users.insert(id, user.clone());

        Ok(user)
    }

    async fn list_tasks_by_user(&mut self, user_id: i64) -> Result<Vec<Task>, StoreError> {
        let mut tasks: Vec<Task> = self
            .staged
            .tasks
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();

        tasks.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(tasks)
    }

    async fn find_task_by_id(&mut self, id: i64) -> Result<Option<Task>, StoreError> {
        Ok(self.staged.tasks.get(&id).cloned())
    }

    async fn lock_task_by_id(&mut self, id: i64) -> Result<Option<Task>, StoreError> {
        // The store-wide lock is already held
        self.find_task_by_id(id).await
    }

    async fn insert_task(&mut self, data: CreateTask) -> Result<Task, StoreError> {
        if !self.staged.users.contains_key(&data.user_id) {
            return Err(StoreError::ForeignKeyViolation(
                "tasks_user_id_fkey".to_string(),
            ));
        }

        let id = self.staged.next_task_id;
        self.staged.next_task_id += 1;

        let now = Utc::now();
        let task = Task {
            id,
            title: data.title,
            description: data.description,
            completed: data.completed,
            user_id: data.user_id,
            created_at: now,
            updated_at: now,
        };
        self.staged.tasks.insert(id, task.clone());

        Ok(task)
    }

    async fn update_task(&mut self, id: i64, data: UpdateTask) -> Result<Task, StoreError> {
        let task = self
            .staged
            .tasks
            .get_mut(&id)
            .ok_or(StoreError::RowNotFound)?;

        data.apply_to(task);
        task.updated_at = Utc::now().max(task.updated_at);

        Ok(task.clone())
    }

    async fn delete_task(&mut self, id: i64) -> Result<(), StoreError> {
        self.staged
            .tasks
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::RowNotFound)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTransaction { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}
