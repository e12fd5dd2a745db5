//! HTTP error mapping for the server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::KvError;

/// Error wrapper for converting store errors to HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub KvError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            KvError::KeyNotFound | KvError::PropertyNotFound(_) => StatusCode::NOT_FOUND,
            err if err.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {}", self.0);
            return status.into_response();
        }

        tracing::debug!("Request rejected ({}): {}", status, self.0);
        (status, status.canonical_reason().unwrap_or_default()).into_response()
    }
}

impl From<KvError> for ApiError {
    fn from(err: KvError) -> Self {
        ApiError(err)
    }
}
