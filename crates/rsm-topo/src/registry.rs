//! Topology registry — tracks the RAN nodes the slice manager may program.
//!
//! Persists node information to the `StateStore` and broadcasts a
//! `NodeEvent` whenever a node is registered or removed.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use rsm_state::{NodeInfo, StateStore, check_id};

use crate::directory::{NodeDirectory, NodeEvent};
use crate::error::{DirectoryError, DirectoryResult};

/// Buffered events per subscriber before slow watchers start lagging.
const EVENT_BUFFER: usize = 256;

/// Registry of known RAN nodes.
pub struct TopoRegistry {
    state: StateStore,
    events: broadcast::Sender<NodeEvent>,
}

impl TopoRegistry {
    /// Create a registry over an existing state store.
    ///
    /// Nodes already persisted in the store are known immediately.
    pub fn new(state: StateStore) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self { state, events }
    }

    /// Register (or re-register) a node and announce it.
    pub fn register(
        &self,
        node_id: &str,
        address: &str,
        labels: BTreeMap<String, String>,
    ) -> DirectoryResult<NodeInfo> {
        check_id(node_id)
            .map_err(|reason| DirectoryError::InvalidNode(format!("{node_id:?} {reason}")))?;

        let node = NodeInfo {
            id: node_id.to_string(),
            address: address.to_string(),
            labels,
            registered_at: epoch_secs(),
        };
        self.state.put_node(&node)?;
        info!(%node_id, %address, "node registered");

        self.publish(NodeEvent {
            node_id: node_id.to_string(),
            removed: false,
        });
        Ok(node)
    }

    /// Remove a node. Returns true if it was known.
    ///
    /// Watchers are only notified when the node actually existed.
    pub fn remove(&self, node_id: &str) -> DirectoryResult<bool> {
        let existed = self.state.delete_node(node_id)?;
        if existed {
            info!(%node_id, "node removed");
            self.publish(NodeEvent {
                node_id: node_id.to_string(),
                removed: true,
            });
        } else {
            warn!(%node_id, "remove requested for unknown node");
        }
        Ok(existed)
    }

    /// Get a single node by ID.
    pub fn get(&self, node_id: &str) -> DirectoryResult<Option<NodeInfo>> {
        Ok(self.state.get_node(node_id)?)
    }

    /// List every known node.
    pub fn list(&self) -> DirectoryResult<Vec<NodeInfo>> {
        Ok(self.state.list_nodes()?)
    }

    fn publish(&self, event: NodeEvent) {
        // No subscribers is not an error.
        if self.events.send(event).is_err() {
            debug!("no node event subscribers");
        }
    }
}

#[async_trait]
impl NodeDirectory for TopoRegistry {
    async fn resolve(&self, node_id: &str) -> DirectoryResult<bool> {
        Ok(self.state.get_node(node_id)?.is_some())
    }

    fn watch(&self) -> broadcast::Receiver<NodeEvent> {
        self.events.subscribe()
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
