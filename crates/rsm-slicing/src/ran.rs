//! RAN programming seam.
//!
//! The E2 exchange that actually installs a slice on a node lives behind
//! `RanProgrammer`. `LoopbackRan` acknowledges everything and is what the
//! daemon runs with when no E2 termination is wired in.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use rsm_state::SliceParams;

/// What the RAN is asked to do with a slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RanOp {
    Add,
    Update,
    Remove,
}

/// Acknowledgment of a programming call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RanAck {
    pub ack: bool,
    /// Why the node refused; empty on success.
    pub cause: String,
}

impl RanAck {
    pub fn accepted() -> Self {
        Self {
            ack: true,
            cause: String::new(),
        }
    }

    pub fn rejected(cause: impl Into<String>) -> Self {
        Self {
            ack: false,
            cause: cause.into(),
        }
    }
}

/// Programs slice configuration onto a RAN node.
#[async_trait]
pub trait RanProgrammer: Send + Sync {
    async fn program(
        &self,
        node_id: &str,
        slice_id: &str,
        params: &SliceParams,
        op: RanOp,
    ) -> RanAck;
}

/// Acknowledges every call after an optional fixed latency.
#[derive(Debug, Clone, Default)]
pub struct LoopbackRan {
    latency: Duration,
}

impl LoopbackRan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an E2 round-trip of `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl RanProgrammer for LoopbackRan {
    async fn program(
        &self,
        node_id: &str,
        slice_id: &str,
        params: &SliceParams,
        op: RanOp,
    ) -> RanAck {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        info!(
            %node_id,
            %slice_id,
            ?op,
            scheduler = ?params.scheduler,
            weight = params.weight,
            "loopback RAN acknowledged"
        );
        RanAck::accepted()
    }
}
