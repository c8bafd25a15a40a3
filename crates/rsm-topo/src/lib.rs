//! rsm-topo — topology registry for the RAN slice manager.
//!
//! Tracks which E2-capable RAN nodes exist and tells interested parties
//! when one appears or goes away.
//!
//! # Architecture
//!
//! ```text
//! NodeDirectory (trait, consumed by the slice orchestrator)
//!   ├── resolve(node_id) → exists?
//!   └── watch() → stream of NodeEvent { node_id, removed }
//!
//! TopoRegistry (implementation)
//!   ├── Persists NodeInfo to StateStore
//!   └── Publishes NodeEvent on a broadcast channel
//! ```

pub mod directory;
pub mod error;
pub mod registry;

pub use directory::{NodeDirectory, NodeEvent};
pub use error::{DirectoryError, DirectoryResult};
pub use registry::TopoRegistry;
