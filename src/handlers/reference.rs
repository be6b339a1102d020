use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
};
use crate::app::AppState;
use crate::errors::AppResult;

pub async fn list_priorities(State(state): State<AppState>) -> AppResult<Response> {
    Ok(Json(state.references.priorities().await?).into_response())
}

pub async fn list_difficulties(State(state): State<AppState>) -> AppResult<Response> {
    Ok(Json(state.references.difficulties().await?).into_response())
}

pub async fn list_statuses(State(state): State<AppState>) -> AppResult<Response> {
    Ok(Json(state.references.statuses().await?).into_response())
}
