//! rsm-state — embedded state store for the RAN slice manager.
//!
//! Backed by [redb](https://docs.rs/redb), provides persistent and in-memory
//! storage for slices, UE-to-slice associations, and known RAN nodes.
//!
//! # Architecture
//!
//! All domain types are JSON-serialized into redb's `&[u8]` value columns.
//! Composite keys (`{node_id}/{slice_id}`, `{node_id}/{ue_id}`) enable
//! prefix scans over everything bound to one node.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
