/// Transactional storage interface
///
/// Services never talk to a connection directly. They open a
/// [`Transaction`], perform every read and write of one operation inside it,
/// and commit. Dropping a transaction without committing rolls it back, so an
/// early `?` return can never leave a partial write behind.
///
/// Two implementations ship with the crate:
///
/// - [`crate::db::postgres::PgStore`]: PostgreSQL via sqlx
/// - [`crate::db::memory::MemoryStore`]: in-process, for development and tests
///
/// Both enforce the unique constraints on `users.username` and `users.email`
/// at write time, so a duplicate that slips past an application-level check
/// still fails with [`StoreError::UniqueViolation`].
///
/// # Example
///
/// ```
/// use tasklane_shared::db::memory::MemoryStore;
/// use tasklane_shared::db::store::Store;
/// use tasklane_shared::models::user::CreateUser;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
///
/// let mut tx = store.begin().await?;
/// let user = tx
///     .insert_user(CreateUser {
///         username: "alice".to_string(),
///         email: "alice@x.com".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///     })
///     .await?;
/// tx.commit().await?;
///
/// let mut tx = store.begin().await?;
/// assert!(tx.find_user_by_id(user.id).await?.is_some());
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;

use crate::models::{
    task::{CreateTask, Task, UpdateTask},
    user::{CreateUser, User},
};

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write; `field` is the column
    #[error("Unique constraint violated on {field}")]
    UniqueViolation { field: String },

    /// A row references a parent that does not exist
    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    /// Row expected by the write is gone
    #[error("Row not found")]
    RowNotFound,

    /// Driver error
    #[error(transparent)]
    Sqlx(sqlx::Error),

    /// Any other backend failure
    #[error("{0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::RowNotFound,
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    let field = match db_err.constraint() {
                        Some(c) if c.contains("username") => "username",
                        Some(c) if c.contains("email") => "email",
                        Some(c) => c,
                        None => "unknown",
                    };
                    return StoreError::UniqueViolation {
                        field: field.to_string(),
                    };
                }
                if db_err.is_foreign_key_violation() {
                    return StoreError::ForeignKeyViolation(
                        db_err.constraint().unwrap_or("unknown").to_string(),
                    );
                }
                StoreError::Sqlx(sqlx::Error::Database(db_err))
            }
            other => StoreError::Sqlx(other),
        }
    }
}

/// Entry point of a storage backend
#[async_trait]
pub trait Store: Send + Sync {
    /// Opens a transaction
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError>;

    /// Verifies the backend is reachable
    async fn ping(&self) -> Result<(), StoreError>;
}

/// One unit of work against the store
///
/// Reads observe the transaction's own uncommitted writes.
#[async_trait]
pub trait Transaction: Send {
    async fn find_user_by_id(&mut self, id: i64) -> Result<Option<User>, StoreError>;

    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError>;

    /// Inserts a user, assigning `id` and `created_at`
    async fn insert_user(&mut self, data: CreateUser) -> Result<User, StoreError>;

    /// A user's tasks ordered by `created_at` descending, then `id` descending
    async fn list_tasks_by_user(&mut self, user_id: i64) -> Result<Vec<Task>, StoreError>;

    async fn find_task_by_id(&mut self, id: i64) -> Result<Option<Task>, StoreError>;

    /// Like [`Transaction::find_task_by_id`], but holds a row lock until the
    /// transaction ends so a following update or delete cannot race
    async fn lock_task_by_id(&mut self, id: i64) -> Result<Option<Task>, StoreError>;

    /// Inserts a task, assigning `id` and both timestamps
    async fn insert_task(&mut self, data: CreateTask) -> Result<Task, StoreError>;

    /// Applies a partial update and refreshes `updated_at`
    async fn update_task(&mut self, id: i64, data: UpdateTask) -> Result<Task, StoreError>;

    async fn delete_task(&mut self, id: i64) -> Result<(), StoreError>;

    /// Publishes every write made in this transaction
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
