//! Task and comment endpoints.
//!
//! Handlers are thin: extract the resolved identity and the request
//! payload, delegate to the store, return the expanded record. All
//! authorization happens inside the store's visibility-scoped queries.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::auth::AuthUser;
use super::routes::AppState;
use crate::error::Result;
use crate::tasks::{
    CommentDetail, CommentWithTask, CreateTaskRequest, Task, TaskDetail, TaskFilterParams,
    TaskStats, UpdateTaskRequest,
};

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

/// POST /tasks - create a task; the caller becomes its creator.
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskDetail>)> {
    let detail = state.store.create_task(user.id, &req).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /tasks - visibility-scoped, filtered, due-date-ascending listing.
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<TaskFilterParams>,
) -> Result<Json<Vec<TaskDetail>>> {
    let filter = params.parse()?;
    let tasks = state.store.list_tasks(user.id, &filter).await?;
    Ok(Json(tasks))
}

/// GET /tasks/stats - aggregate counts over the caller's visible tasks.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<TaskStats>> {
    let stats = state.store.task_stats(user.id).await?;
    Ok(Json(stats))
}

/// GET /tasks/:id
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskDetail>> {
    let detail = state.store.get_task(user.id, id).await?;
    Ok(Json(detail))
}

/// PATCH /tasks/:id - partial update.
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateTaskRequest>,
) -> Result<Json<TaskDetail>> {
    let detail = state.store.update_task(user.id, id, &patch).await?;
    Ok(Json(detail))
}

/// DELETE /tasks/:id - returns the deleted record.
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>> {
    let task = state.store.delete_task(user.id, id).await?;
    Ok(Json(task))
}

/// POST /tasks/:id/comments
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<CommentRequest>,
) -> Result<(StatusCode, Json<CommentWithTask>)> {
    let comment = state.store.add_comment(user.id, id, &req.content).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// GET /tasks/:id/comments - oldest first.
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CommentDetail>>> {
    let comments = state.store.list_comments(user.id, id).await?;
    Ok(Json(comments))
}
