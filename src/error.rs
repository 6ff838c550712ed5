use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Errors surfaced at the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to fetch jobs".to_string(),
                )
            }
        };

        let body = axum::Json(json!({ "success": false, "error": message }));
        (status, body).into_response()
    }
}

/// Why a single source produced no postings.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("no credentials configured")]
    MissingCredentials,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("unexpected response shape: {0}")]
    Parse(String),

    #[error("invalid selector: {0}")]
    Selector(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("cache lock poisoned")]
    Poisoned,
}
