//! Domain types for the slice manager state store.
//!
//! These types represent the persisted state of slices, UE associations
//! and RAN nodes. All types are serializable to/from JSON for storage in
//! redb tables and for the REST API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of an E2-capable RAN node.
pub type NodeId = String;

/// Caller-supplied slice identifier, unique per node.
pub type SliceId = String;

/// Identifier of a UE session.
pub type UeId = String;

// ── Slice ─────────────────────────────────────────────────────────

/// Lifecycle state of a slice on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SliceState {
    Pending,
    Active,
    Updating,
    Deleting,
    Failed,
    Deleted,
}

impl SliceState {
    /// Whether the slice still occupies its identity (anything but `Deleted`).
    pub fn is_live(self) -> bool {
        self != SliceState::Deleted
    }
}

/// Traffic direction a slice applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SliceDirection {
    #[default]
    Downlink,
    Uplink,
}

/// Scheduler the RAN node runs inside the slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerType {
    #[default]
    RoundRobin,
    ProportionalFair,
    QosBased,
}

/// RAN scheduling parameters for a slice.
///
/// The typed fields cover what every node understands; `extra` carries
/// vendor parameters through to the RAN untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SliceParams {
    #[serde(default)]
    pub direction: SliceDirection,
    #[serde(default)]
    pub scheduler: SchedulerType,
    /// Relative share of radio resources.
    #[serde(default)]
    pub weight: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

/// A slice configured (or being configured) on a RAN node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slice {
    pub node_id: NodeId,
    pub slice_id: SliceId,
    pub params: SliceParams,
    pub state: SliceState,
    /// Cause reported by the RAN when the slice last entered `Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_cause: Option<String>,
    /// Unix timestamp (seconds) when this slice was created.
    pub created_at: u64,
    /// Unix timestamp (seconds) of the last state change.
    pub updated_at: u64,
}

// ── UE association ────────────────────────────────────────────────

/// Binding of a UE session to a slice on one node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UeSliceAssociation {
    pub node_id: NodeId,
    pub ue_id: UeId,
    pub slice_id: SliceId,
    /// Data radio bearer the association applies to, if not all of them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drb_id: Option<u32>,
    /// Unix timestamp (seconds) when the association was written.
    pub associated_at: u64,
}

// ── Node ──────────────────────────────────────────────────────────

/// A RAN node known to the topology registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeInfo {
    pub id: NodeId,
    /// E2 endpoint of the node (host:port).
    pub address: String,
    /// Arbitrary labels (vendor, cell, site...).
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Unix timestamp when the node was registered.
    pub registered_at: u64,
}

impl Slice {
    /// Build the composite key for the slices table.
    pub fn table_key(&self) -> String {
        slice_key(&self.node_id, &self.slice_id)
    }
}

impl UeSliceAssociation {
    /// Build the composite key for the associations table.
    pub fn table_key(&self) -> String {
        association_key(&self.node_id, &self.ue_id)
    }
}

/// Composite key of a slice record.
pub fn slice_key(node_id: &str, slice_id: &str) -> String {
    format!("{node_id}/{slice_id}")
}

/// Composite key of a UE association record.
pub fn association_key(node_id: &str, ue_id: &str) -> String {
    format!("{node_id}/{ue_id}")
}

/// Longest identifier accepted for nodes, slices and UEs.
pub const MAX_ID_LEN: usize = 64;

/// Check an identifier can be used as a key segment. The error names what
/// is wrong with it.
pub fn check_id(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("must not be empty".to_string());
    }
    if value.len() > MAX_ID_LEN {
        return Err(format!("longer than {MAX_ID_LEN} bytes"));
    }
    if value.contains('/') {
        return Err("must not contain '/'".to_string());
    }
    Ok(())
}
