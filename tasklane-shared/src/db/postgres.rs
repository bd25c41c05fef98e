/// PostgreSQL store
///
/// Thin adapter from [`Store`]/[`Transaction`] onto the model query functions.
/// A [`PgTransaction`] owns an sqlx transaction; sqlx rolls it back when it is
/// dropped uncommitted.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use tracing::debug;

use super::{
    pool,
    store::{Store, StoreError, Transaction},
};
use crate::models::{
    task::{CreateTask, Task, UpdateTask},
    user::{CreateUser, User},
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
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        pool::health_check(&self.pool).await?;
        Ok(())
    }
}

/// Open PostgreSQL transaction
pub struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn find_user_by_id(&mut self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(&mut *self.tx, id).await?)
    }

    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_username(&mut *self.tx, username).await?)
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_email(&mut *self.tx, email).await?)
    }

    async fn insert_user(&mut self, data: CreateUser) -> Result<User, StoreError> {
        Ok(User::create(&mut *self.tx, data).await?)
    }

    async fn list_tasks_by_user(&mut self, user_id: i64) -> Result<Vec<Task>, StoreError> {
        Ok(Task::list_by_user(&mut *self.tx, user_id).await?)
    }

    async fn find_task_by_id(&mut self, id: i64) -> Result<Option<Task>, StoreError> {
        Ok(Task::find_by_id(&mut *self.tx, id).await?)
    }

    async fn lock_task_by_id(&mut self, id: i64) -> Result<Option<Task>, StoreError> {
        Ok(Task::find_by_id_for_update(&mut *self.tx, id).await?)
    }

    async fn insert_task(&mut self, data: CreateTask) -> Result<Task, StoreError> {
        Ok(Task::create(&mut *self.tx, data).await?)
    }

    async fn update_task(&mut self, id: i64, data: UpdateTask) -> Result<Task, StoreError> {
        Task::update(&mut *self.tx, id, data)
            .await?
            .ok_or(StoreError::RowNotFound)
    }

    async fn delete_task(&mut self, id: i64) -> Result<(), StoreError> {
        if Task::delete(&mut *self.tx, id).await? {
            Ok(())
        } else {
            Err(StoreError::RowNotFound)
        }
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        debug!("Transaction committed");
        Ok(())
    }
}
