use crate::errors::{AppError, AppResult};

/// Session key under which the authenticated user's id is stored.
pub const SESSION_USER_ID_KEY: &str = "user_id";

/// Who is making the request, as read from the session before the handler runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Option<i64>,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    pub fn user(user_id: i64) -> Self {
        Self { user_id: Some(user_id) }
    }

    pub fn require_user(&self) -> AppResult<i64> {
        self.user_id
            .ok_or_else(|| AppError::Auth("Not authenticated".into()))
    }
}
