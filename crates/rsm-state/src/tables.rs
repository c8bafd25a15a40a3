//! redb table definitions for the slice manager state store.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized domain types).
//! Composite keys follow the pattern `{node_id}/{child_id}`.

use redb::TableDefinition;

/// Slice records keyed by `{node_id}/{slice_id}`.
pub const SLICES: TableDefinition<&str, &[u8]> = TableDefinition::new("slices");

/// UE-to-slice associations keyed by `{node_id}/{ue_id}`.
pub const UE_ASSOCIATIONS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("ue_associations");

/// Known RAN nodes keyed by `{node_id}`.
pub const NODES: TableDefinition<&str, &[u8]> = TableDefinition::new("nodes");
