use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use crate::app::AppState;
use crate::errors::AppResult;
use crate::models::{CreateTaskForm, Identity, TaskQuery, UpdateTaskForm};

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskQuery>,
) -> AppResult<Response> {
    let filter = query.into_filter();
    let tasks = state.tasks.list_tasks(&filter).await?;
    Ok(Json(tasks).into_response())
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<CreateTaskForm>, JsonRejection>,
) -> AppResult<Response> {
    // Unauthenticated callers get 401 even when the body is also bad
    identity.require_user()?;
    let Json(form) = payload?;
    let task = state.tasks.create_task(&identity, form).await?;
    Ok((StatusCode::CREATED, Json(task)).into_response())
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    task_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateTaskForm>, JsonRejection>,
) -> AppResult<Response> {
    identity.require_user()?;
    let Path(task_id) = task_id?;
    // A missing or foreign task wins over a malformed body
    let task = state.tasks.owned_task(&identity, task_id).await?;
    let Json(form) = payload?;
    let task = state.tasks.apply_update(task, form).await?;
    Ok(Json(task).into_response())
}

pub async fn delete_task(
    State(state): State<AppState>,
    task_id: Result<Path<i64>, PathRejection>,
) -> AppResult<Response> {
    let Path(task_id) = task_id?;
    state.tasks.delete_task(task_id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
