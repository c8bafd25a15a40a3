//! Slice orchestration error taxonomy.

use std::time::Duration;

use thiserror::Error;

/// Every way a northbound slice operation can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SliceError {
    /// Malformed request; rejected before it reaches any queue.
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("slice {slice_id} already exists on node {node_id}")]
    AlreadyExists { node_id: String, slice_id: String },

    #[error("not found: {0}")]
    NotFound(String),

    /// Negative acknowledgment from the RAN; the cause is passed through as-is.
    #[error("RAN rejected request: {0}")]
    RanRejected(String),

    /// The node's queue is full. Retry with backoff.
    #[error("node {0} is overloaded, retry later")]
    Overloaded(String),

    /// The caller stopped waiting. The operation may still complete.
    #[error("deadline of {0:?} exceeded; the operation may still complete")]
    DeadlineExceeded(Duration),

    #[error("internal error: {0}")]
    Internal(String),
}

impl SliceError {
    /// Stable machine-readable code for the gateway.
    pub fn code(&self) -> &'static str {
        match self {
            SliceError::Validation(_) => "VALIDATION_ERROR",
            SliceError::NodeNotFound(_) => "NODE_NOT_FOUND",
            SliceError::AlreadyExists { .. } => "ALREADY_EXISTS",
            SliceError::NotFound(_) => "NOT_FOUND",
            SliceError::RanRejected(_) => "RAN_REJECTED",
            SliceError::Overloaded(_) => "OVERLOADED",
            SliceError::DeadlineExceeded(_) => "DEADLINE_EXCEEDED",
            SliceError::Internal(_) => "INTERNAL",
        }
    }

    /// Only backpressure is meant to be retried by callers.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SliceError::Overloaded(_))
    }
}

impl From<rsm_state::StateError> for SliceError {
    fn from(e: rsm_state::StateError) -> Self {
        SliceError::Internal(format!("state store: {e}"))
    }
}

impl From<rsm_topo::DirectoryError> for SliceError {
    fn from(e: rsm_topo::DirectoryError) -> Self {
        SliceError::Internal(format!("node directory: {e}"))
    }
}

pub type SliceResult<T> = Result<T, SliceError>;
