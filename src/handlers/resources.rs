use axum::http::Uri;
use crate::errors::AppError;

/// Fallback for the `/Resources` file service. The nested service sees the
/// path with the prefix already stripped.
pub async fn resource_not_found(uri: Uri) -> AppError {
    let filename = uri.path().trim_start_matches('/');
    tracing::debug!("No resource named {}", filename);
    AppError::NotFound(format!("Resource not found: {}", filename))
}
