//! Node directory error types.

use thiserror::Error;

/// Errors surfaced by a node directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("invalid node: {0}")]
    InvalidNode(String),

    #[error("state store error: {0}")]
    State(#[from] rsm_state::StateError),
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;
