use axum::{
    middleware::Next,
    response::{IntoResponse, Response},
    extract::Request,
    body::Body,
};
use tower_sessions::Session;
use crate::errors::{AppError, AppResult};
use crate::models::{Identity, SESSION_USER_ID_KEY};

/// Reads the session binding once and hands it to handlers as an `Identity`
/// extension. Routes decide for themselves whether they need a user.
pub async fn attach_identity(
    session: Session,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let identity = match session.get::<i64>(SESSION_USER_ID_KEY).await {
        Ok(Some(user_id)) => Identity::user(user_id),
        Ok(None) => Identity::anonymous(),
        Err(e) => return AppError::from(e).into_response(),
    };

    tracing::trace!("{} {} as {:?}", req.method(), req.uri().path(), identity.user_id);
    req.extensions_mut().insert(identity);
    next.run(req).await
}

/// Binds `user_id` under a fresh session id, so an id handed out before
/// login never becomes authenticated.
pub async fn bind_identity(session: &Session, user_id: i64) -> AppResult<()> {
    session.cycle_id().await?;
    session.insert(SESSION_USER_ID_KEY, user_id).await?;
    Ok(())
}

// Succeeds whether or not anything was bound
pub async fn clear_identity(session: &Session) -> AppResult<()> {
    session.remove::<i64>(SESSION_USER_ID_KEY).await?;
    Ok(())
}
