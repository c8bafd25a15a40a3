//! The acknowledgment every mutating call answers with.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use rsm_slicing::{SliceError, SliceResult};

/// Outcome of a slice operation.
///
/// `success == false` always comes with a non-empty `cause` and the code the
/// orchestrator assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    pub cause: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            success: true,
            cause: "OK".to_string(),
            code: None,
        }
    }

    pub fn failed(err: &SliceError) -> Self {
        Self {
            success: false,
            cause: err.to_string(),
            code: Some(err.code().to_string()),
        }
    }
}

impl From<SliceResult<()>> for Ack {
    fn from(result: SliceResult<()>) -> Self {
        match result {
            Ok(()) => Ack::ok(),
            Err(e) => Ack::failed(&e),
        }
    }
}

/// HTTP status for an orchestrator error.
pub fn status_for(err: &SliceError) -> StatusCode {
    match err {
        SliceError::Validation(_) => StatusCode::BAD_REQUEST,
        SliceError::NodeNotFound(_) | SliceError::NotFound(_) => StatusCode::NOT_FOUND,
        SliceError::AlreadyExists { .. } => StatusCode::CONFLICT,
        SliceError::RanRejected(_) => StatusCode::BAD_GATEWAY,
        SliceError::Overloaded(_) => StatusCode::SERVICE_UNAVAILABLE,
        SliceError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
        SliceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Render an operation outcome as `(status, Ack)`.
pub fn respond(result: SliceResult<()>) -> Response {
    match result {
        Ok(()) => (StatusCode::OK, Json(Ack::ok())).into_response(),
        Err(e) => {
            let mut resp = (status_for(&e), Json(Ack::failed(&e))).into_response();
            if e.is_retryable() {
                resp.headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
            }
            resp
        }
    }
}
