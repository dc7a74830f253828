//! Error types for the HTTP endpoints.

use std::error::Error;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Error type for HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Server errors, indicating that something went wrong when executing a request.
    #[error("server error: {0}")]
    Server(#[source] Box<dyn Error + Send + Sync>),
}

impl ApiError {
    pub fn server(error: impl Error + Send + Sync + 'static) -> Self {
        Self::Server(Box::new(error))
    }
}

/// Result type for HTTP handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(
            error = &self as &dyn Error,
            "error handling request"
        );

        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}
