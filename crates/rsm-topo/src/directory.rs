//! The node directory contract.

use async_trait::async_trait;
use tokio::sync::broadcast;

use rsm_state::NodeId;

use crate::error::DirectoryResult;

/// A change in the set of known nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEvent {
    pub node_id: NodeId,
    /// `true` when the node left, `false` when it (re)appeared.
    pub removed: bool,
}

/// Read-only view of the topology: node existence plus change events.
///
/// Implementations must be side-effect free on `resolve`.
#[async_trait]
pub trait NodeDirectory: Send + Sync {
    /// Whether `node_id` is currently a known node.
    async fn resolve(&self, node_id: &str) -> DirectoryResult<bool>;

    /// Subscribe to node add/remove events from now on.
    fn watch(&self) -> broadcast::Receiver<NodeEvent>;
}
