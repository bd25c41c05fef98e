//! Shared fixtures for service-level tests
//!
//! - `identity()` / `task_fixture()` build services over a fresh `MemoryStore`
//! - `FailingStore` wraps a store and injects a storage failure at a chosen
//!   step, for rollback tests

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tasklane_shared::auth::{jwt::TokenService, password::HashParams};
use tasklane_shared::db::memory::MemoryStore;
use tasklane_shared::db::store::{Store, StoreError, Transaction};
use tasklane_shared::models::{
    task::{CreateTask, Task, UpdateTask},
    user::{CreateUser, User},
};
use tasklane_shared::services::{identity::IdentityService, tasks::TaskService};
use tasklane_shared::validation::{Credentials, NewTask, Registration};

pub const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// Cheap argon2 parameters so tests stay fast
pub fn hash_params() -> HashParams {
    HashParams {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

pub fn token_service() -> TokenService {
    TokenService::new(SECRET, Duration::minutes(30))
}

pub fn identity(store: Arc<dyn Store>) -> IdentityService {
    IdentityService::new(store, token_service(), hash_params())
}

pub fn registration(username: &str, email: &str, password: &str) -> Registration {
    Registration {
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    }
}

pub fn credentials(username: &str, password: &str) -> Credentials {
    Credentials {
        username: username.to_string(),
        password: password.to_string(),
    }
}

pub fn new_task(title: &str) -> NewTask {
    NewTask {
        title: title.to_string(),
        description: None,
        completed: false,
    }
}

/// Registers a user and returns the stored record
pub async fn create_user(store: &Arc<dyn Store>, username: &str) -> User {
    let view = identity(store.clone())
        .register(registration(
            username,
            &format!("{}@x.com", username),
            "pw123456",
        ))
        .await
        .unwrap();

    let mut tx = store.begin().await.unwrap();
    tx.find_user_by_id(view.id).await.unwrap().unwrap()
}

pub struct TaskFixture {
    pub store: Arc<dyn Store>,
    pub tasks: TaskService,
    pub alice: User,
    pub bob: User,
}

/// Two users over a fresh store
pub async fn task_fixture() -> TaskFixture {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let alice = create_user(&store, "alice").await;
    let bob = create_user(&store, "bobby").await;

    TaskFixture {
        tasks: TaskService::new(store.clone()),
        store,
        alice,
        bob,
    }
}

/// Step at which `FailingStore` fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    InsertUser,
    InsertTask,
    UpdateTask,
    DeleteTask,
    Commit,
}

/// Store wrapper that fails one step with a backend error
pub struct FailingStore {
    inner: MemoryStore,
    fail_at: FailAt,
}

impl FailingStore {
    pub fn new(inner: MemoryStore, fail_at: FailAt) -> Self {
        Self { inner, fail_at }
    }
}

fn injected() -> StoreError {
    StoreError::Backend("injected failure".to_string())
}

#[async_trait]
impl Store for FailingStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError> {
        let inner = self.inner.begin().await?;
        Ok(Box::new(FailingTransaction {
            inner,
            fail_at: self.fail_at,
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }
}

struct FailingTransaction {
    inner: Box<dyn Transaction>,
    fail_at: FailAt,
}

#[async_trait]
impl Transaction for FailingTransaction {
    async fn find_user_by_id(&mut self, id: i64) -> Result<Option<User>, StoreError> {
        self.inner.find_user_by_id(id).await
    }

    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, StoreError> {
        self.inner.find_user_by_username(username).await
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        self.inner.find_user_by_email(email).await
    }

    async fn insert_user(&mut self, data: CreateUser) -> Result<User, StoreError> {
        if self.fail_at == FailAt::InsertUser {
            return Err(injected());
        }
        self.inner.insert_user(data).await
    }

    async fn list_tasks_by_user(&mut self, user_id: i64) -> Result<Vec<Task>, StoreError> {
        self.inner.list_tasks_by_user(user_id).await
    }

    async fn find_task_by_id(&mut self, id: i64) -> Result<Option<Task>, StoreError> {
        self.inner.find_task_by_id(id).await
    }

    async fn lock_task_by_id(&mut self, id: i64) -> Result<Option<Task>, StoreError> {
        self.inner.lock_task_by_id(id).await
    }

    async fn insert_task(&mut self, data: CreateTask) -> Result<Task, StoreError> {
        if self.fail_at == FailAt::InsertTask {
            return Err(injected());
        }
        self.inner.insert_task(data).await
    }

    async fn update_task(&mut self, id: i64, data: UpdateTask) -> Result<Task, StoreError> {
        if self.fail_at == FailAt::UpdateTask {
            return Err(injected());
        }
        self.inner.update_task(id, data).await
    }

    async fn delete_task(&mut self, id: i64) -> Result<(), StoreError> {
        if self.fail_at == FailAt::DeleteTask {
            return Err(injected());
        }
        self.inner.delete_task(id).await
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        if self.fail_at == FailAt::Commit {
            return Err(injected());
        }
        self.inner.commit().await
    }
}

/// Store wrapper whose user lookups never find anything
///
/// Mimics a registration racing another one: both pass the lookups, and only
/// the unique constraint on insert can stop the second.
pub struct BlindLookupStore {
    inner: MemoryStore,
}

impl BlindLookupStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Store for BlindLookupStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError> {
        let inner = self.inner.begin().await?;
        Ok(Box::new(BlindLookupTransaction { inner }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }
}

struct BlindLookupTransaction {
    inner: Box<dyn Transaction>,
}

#[async_trait]
impl Transaction for BlindLookupTransaction {
    async fn find_user_by_id(&mut self, id: i64) -> Result<Option<User>, StoreError> {
        self.inner.find_user_by_id(id).await
    }

    async fn find_user_by_username(&mut self, _username: &str) -> Result<Option<User>, StoreError> {
        Ok(None)
    }

    async fn find_user_by_email(&mut self, _email: &str) -> Result<Option<User>, StoreError> {
        Ok(None)
    }

    async fn insert_user(&mut self, data: CreateUser) -> Result<User, StoreError> {
        self.inner.insert_user(data).await
    }

    async fn list_tasks_by_user(&mut self, user_id: i64) -> Result<Vec<Task>, StoreError> {
        self.inner.list_tasks_by_user(user_id).await
    }

    async fn find_task_by_id(&mut self, id: i64) -> Result<Option<Task>, StoreError> {
        self.inner.find_task_by_id(id).await
    }

    async fn lock_task_by_id(&mut self, id: i64) -> Result<Option<Task>, StoreError> {
        self.inner.lock_task_by_id(id).await
    }

    async fn insert_task(&mut self, data: CreateTask) -> Result<Task, StoreError> {
        self.inner.insert_task(data).await
    }

    async fn update_task(&mut self, id: i64, data: UpdateTask) -> Result<Task, StoreError> {
        self.inner.update_task(id, data).await
    }

    async fn delete_task(&mut self, id: i64) -> Result<(), StoreError> {
        self.inner.delete_task(id).await
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.inner.commit().await
    }
}
