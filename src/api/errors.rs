//! API Error Handling
//!
//! Engine refusals map onto HTTP statuses with a flat `{"error": msg}`
//! body. A failed action never carries a balance; the request id rides
//! in headers and logs only.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::errors::EngineError;

/// Wire body of every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReply {
    pub error: String,
}

/// An error response on its way out, tagged with the request id.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub request_id: String,
}

impl ApiError {
    /// Map an engine refusal onto its HTTP status.
    pub fn from_engine(request_id: String, err: EngineError) -> Self {
        let status = match &err {
            EngineError::Validation(_) | EngineError::InsufficientFunds { .. } => {
                StatusCode::BAD_REQUEST
            }
            EngineError::State(_) => StatusCode::CONFLICT,
            EngineError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            EngineError::LedgerUnavailable(_) => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: err.to_string(),
            request_id,
        }
    }

    pub fn bad_request(request_id: String, message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
            request_id,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.request_id, self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!("[{}] {} {}", self.request_id, self.status, self.message);
        let body = Json(ErrorReply {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_for(err: EngineError) -> StatusCode {
        ApiError::from_engine("req-1".to_string(), err).status
    }

    #[test]
    fn test_engine_errors_map_to_distinct_statuses() {
        assert_eq!(
            status_for(EngineError::Validation("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(EngineError::InsufficientFunds {
                balance: 10,
                required: 100
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(EngineError::State("round not started".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(status_for(EngineError::RateLimited), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            status_for(EngineError::LedgerUnavailable("timeout".to_string())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_error_body_is_flat() {
        let reply = ErrorReply {
            error: "round not started".to_string(),
        };
        let json = serde_json::to_value(&reply).expect("serialize");
        assert_eq!(json["error"], "round not started");
        assert_eq!(json.as_object().expect("object").len(), 1);
    }
}
