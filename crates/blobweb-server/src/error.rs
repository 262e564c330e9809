use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Body of every 404 response.
pub const NOT_FOUND_BODY: &str = "404 page not found\n";

#[derive(Debug, Error)]
pub enum ServerError {
    /// Any routing, resolution, or open failure. Carries no detail: nothing
    /// about the backend leaks into a 404.
    #[error("not found")]
    NotFound,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response(),
            other => {
                tracing::error!(error = %other, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "500 internal server error\n").into_response()
            }
        }
    }
}
