// Defines the application error type and result alias using the thiserror crate.
use thiserror::Error;

pub mod response;

#[derive(Error, Debug)]
pub enum AppError {
    // Missing or malformed input
    #[error("{0}")]
    Validation(String),

    // Duplicate value for a unique field
    #[error("{0}")]
    Conflict(String),

    // A task points at a priority, difficulty, status or user that does not exist
    #[error("{0}")]
    Reference(String),

    // No session identity, or bad credentials
    #[error("{0}")]
    Auth(String),

    // Authenticated, but not the owner
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn missing_field(field: &str) -> Self {
        AppError::Validation(format!("Missing required field: {}", field))
    }
}

// Custom result type
pub type AppResult<T> = Result<T, AppError>;
