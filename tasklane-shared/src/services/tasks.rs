/// Task service
///
/// Owner-scoped CRUD. The caller's identity is passed in explicitly on every
/// call; a task is only ever returned to, or changed on behalf of, its owner.
///
/// Lookup order for a single task is fixed: a missing id is `NotFound`, an
/// existing task owned by someone else is `Authorization`. Update and delete
/// lock the row for the rest of their transaction so the ownership check and
/// the write see the same state.

use std::sync::Arc;

use tracing::{debug, info};

use super::StoreResultExt;
use crate::db::store::Store;
use crate::error::{AppError, AppResult};
use crate::models::{
    task::{CreateTask, Task, UpdateTask},
    user::User,
};
use crate::validation::NewTask;

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn Store>,
}

impl TaskService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// All of `user`'s tasks, newest first
    pub async fn list_for_user(&self, user: &User) -> AppResult<Vec<Task>> {
        let mut tx = self.store.begin().await.or_db("Failed to list tasks")?;
        let tasks = tx
            .list_tasks_by_user(user.id)
            .await
            .or_db("Failed to list tasks")?;

        debug!(user_id = user.id, count = tasks.len(), "Listed tasks");
        Ok(tasks)
    }

    /// Fetches one task
    ///
    /// # Errors
    ///
    /// - `NotFound` if no task has this id
    /// - `Authorization` if the task belongs to another user
    pub async fn get_by_id(&self, task_id: i64, user: &User) -> AppResult<Task> {
        let mut tx = self.store.begin().await.or_db("Failed to load task")?;
        let task = tx
            .find_task_by_id(task_id)
            .await
            .or_db("Failed to load task")?;

        owned_by(task, task_id, user)
    }

    /// Creates a task owned by `user`
    pub async fn create(&self, input: NewTask, user: &User) -> AppResult<Task> {
        let mut tx = self.store.begin().await.or_db("Failed to create task")?;

        let task = tx
            .insert_task(CreateTask {
                user_id: user.id,
                title: input.title,
                description: input.description,
                completed: input.completed,
            })
            .await
            .or_db("Failed to create task")?;

        tx.commit().await.or_db("Failed to create task")?;

        info!(task_id = task.id, user_id = user.id, "Task created");
        Ok(task)
    }

    /// Applies a partial update
    ///
    /// Fields left as `None` in `changes` keep their stored value;
    /// `updated_at` is refreshed either way.
    pub async fn update(&self, task_id: i64, changes: UpdateTask, user: &User) -> AppResult<Task> {
        let mut tx = self.store.begin().await.or_db("Failed to update task")?;

        let current = tx
            .lock_task_by_id(task_id)
            .await
            .or_db("Failed to update task")?;
        owned_by(current, task_id, user)?;

        if changes.is_empty() {
            debug!(task_id, "Update carries no fields; refreshing updated_at only");
        }

        let task = tx
            .update_task(task_id, changes)
            .await
            .or_db("Failed to update task")?;

        tx.commit().await.or_db("Failed to update task")?;

        info!(task_id, user_id = user.id, "Task updated");
        Ok(task)
    }

    /// Deletes a task
    pub async fn delete(&self, task_id: i64, user: &User) -> AppResult<()> {
        let mut tx = self.store.begin().await.or_db("Failed to delete task")?;

        let current = tx
            .lock_task_by_id(task_id)
            .await
            .or_db("Failed to delete task")?;
        owned_by(current, task_id, user)?;

        tx.delete_task(task_id)
            .await
            .or_db("Failed to delete task")?;

        tx.commit().await.or_db("Failed to delete task")?;

        info!(task_id, user_id = user.id, "Task deleted");
        Ok(())
    }
}

fn owned_by(task: Option<Task>, task_id: i64, user: &User) -> AppResult<Task> {
    let task = task.ok_or_else(|| AppError::not_found("Task").with_detail("task_id", task_id))?;

    if task.user_id != user.id {
        debug!(task_id, user_id = user.id, "Access to another user's task denied");
        return Err(AppError::authorization("You do not have access to this task")
            .with_detail("task_id", task_id)
            .with_detail("user_id", user.id));
    }

    Ok(task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::Utc;

    fn user(id: i64) -> User {
        User {
            id,
            username: format!("user{}", id),
            email: format!("user{}@x.com", id),
            password_hash: "hash".to_string(),
            created_at: Utc::now(),
        }
    }

    fn task(id: i64, owner: i64) -> Task {
        let now = Utc::now();
        Task {
            id,
            title: "t".to_string(),
            description: None,
            completed: false,
            user_id: owner,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_owned_by_missing_is_not_found() {
        let err = owned_by(None, 5, &user(1)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ResourceNotFound);
        assert_eq!(err.message(), "Task not found");
        assert_eq!(err.details()["task_id"], 5);
    }

    #[test]
    fn test_owned_by_other_user_is_forbidden() {
        let err = owned_by(Some(task(5, 2)), 5, &user(1)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnauthorizedAccess);
        assert_eq!(err.details()["user_id"], 1);
    }

    #[test]
    fn test_owned_by_owner() {
        let found = owned_by(Some(task(5, 1)), 5, &user(1)).unwrap();
        assert_eq!(found.id, 5);
    }
}
