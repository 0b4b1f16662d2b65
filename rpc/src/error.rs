//! RPC error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use sigrelay_node::IntentError;
use sigrelay_types::ParseError;
use thiserror::Error;

/// Failures of the server itself.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// Error body returned by every endpoint: `{code, message}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ApiError {
    pub code: u16,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<IntentError> for ApiError {
    fn from(e: IntentError) -> Self {
        Self {
            code: e.status_code(),
            message: e.public_message(),
        }
    }
}

impl From<ParseError> for ApiError {
    fn from(e: ParseError) -> Self {
        IntentError::from(e).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_errors_keep_their_status() {
        let err = ApiError::from(IntentError::DuplicateSubmission);
        assert_eq!(err.code, 409);

        let err = ApiError::from(IntentError::UpstreamUnavailable("rpc at 10.0.0.3 down".into()));
        assert_eq!(err.code, 500);
        assert!(!err.message.contains("10.0.0.3"));
    }

    #[test]
    fn body_shape() {
        let body = serde_json::to_value(ApiError::bad_request("nope")).unwrap();
        assert_eq!(body, serde_json::json!({ "code": 400, "message": "nope" }));
    }
}
