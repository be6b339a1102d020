use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tower_sessions::Session;
use crate::app::AppState;
use crate::errors::AppResult;
use crate::middleware::{bind_identity, clear_identity};
use crate::models::{Identity, LoginForm, RegisterForm};

pub async fn handle_register(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<RegisterForm>, JsonRejection>,
) -> AppResult<Response> {
    let Json(form) = payload?;
    let user = state.auth.register(form).await?;
    bind_identity(&session, user.id).await?;
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

pub async fn handle_login(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<LoginForm>, JsonRejection>,
) -> AppResult<Response> {
    let Json(form) = payload?;
    let user = state.auth.login(form).await?;
    bind_identity(&session, user.id).await?;
    Ok(Json(user).into_response())
}

pub async fn current_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> AppResult<Response> {
    let user = state.auth.current_user(&identity).await?;
    Ok(Json(user).into_response())
}

pub async fn handle_logout(session: Session) -> AppResult<Response> {
    clear_identity(&session).await?;
    tracing::debug!("Session identity cleared");
    Ok(Json(json!({ "message": "Logged out successfully" })).into_response())
}
