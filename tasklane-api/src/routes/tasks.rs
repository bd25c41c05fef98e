/// Task endpoints
///
/// Every endpoint requires `Authorization: Bearer <token>`. Each handler runs
/// the pipeline stages in order:
///
/// 1. validate the body (create, update)
/// 2. authenticate the caller
/// 3. call the Task service, which checks ownership
///
/// # Endpoints
///
/// - `GET    /api/tasks` - List own tasks, newest first
/// - `POST   /api/tasks` - Create a task
/// - `GET    /api/tasks/:id` - Fetch one task
/// - `PUT    /api/tasks/:id` - Partially update a task
/// - `DELETE /api/tasks/:id` - Delete a task

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{TaskId, Validated},
};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use tasklane_shared::{
    models::task::TaskView,
    validation::{CreateTaskRequest, UpdateTaskRequest},
};

/// List response
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub message: String,
    pub tasks: Vec<TaskView>,
    pub total: usize,
}

/// Single-task response
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    pub message: String,
    pub task: TaskView,
}

/// Response carrying only a message
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

fn task_response(message: &str, task: impl Into<TaskView>) -> Json<TaskResponse> {
    Json(TaskResponse {
        message: message.to_string(),
        task: task.into(),
    })
}

/// `GET /api/tasks`
pub async fn list_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<TaskListResponse>> {
    let user = state.authenticate(&headers).await?;

    let tasks: Vec<TaskView> = state
        .tasks
        .list_for_user(&user)
        .await?
        .into_iter()
        .map(TaskView::from)
        .collect();

    Ok(Json(TaskListResponse {
        message: "Tasks retrieved successfully".to_string(),
        total: tasks.len(),
        tasks,
    }))
}

/// `POST /api/tasks`
///
/// ```json
/// { "title": "buy milk", "description": "2 litres", "completed": false }
/// ```
///
/// Only `title` is required.
pub async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Validated(input): Validated<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let user = state.authenticate(&headers).await?;
    let task = state.tasks.create(input, &user).await?;

    Ok((
        StatusCode::CREATED,
        task_response("Task created successfully", task),
    ))
}

/// `GET /api/tasks/:id`
///
/// # Errors
///
/// - `404 Not Found`: No task with this id
/// - `403 Forbidden`: Task belongs to another user
pub async fn get_task(
    State(state): State<AppState>,
    TaskId(task_id): TaskId,
    headers: HeaderMap,
) -> ApiResult<Json<TaskResponse>> {
    let user = state.authenticate(&headers).await?;
    let task = state.tasks.get_by_id(task_id, &user).await?;

    Ok(task_response("Task retrieved successfully", task))
}

/// `PUT /api/tasks/:id`
///
/// Partial update: only the fields present in the body change.
/// `"description": null` clears the description; `"title": null` is
/// rejected.
pub async fn update_task(
    State(state): State<AppState>,
    TaskId(task_id): TaskId,
    headers: HeaderMap,
    Validated(changes): Validated<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let user = state.authenticate(&headers).await?;
    let task = state.tasks.update(task_id, changes, &user).await?;

    Ok(task_response("Task updated successfully", task))
}

/// `DELETE /api/tasks/:id`
pub async fn delete_task(
    State(state): State<AppState>,
    TaskId(task_id): TaskId,
    headers: HeaderMap,
) -> ApiResult<Json<MessageResponse>> {
    let user = state.authenticate(&headers).await?;
    state.tasks.delete(task_id, &user).await?;

    Ok(Json(MessageResponse {
        message: "Task deleted successfully".to_string(),
    }))
}
