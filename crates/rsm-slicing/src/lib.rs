//! rsm-slicing — request orchestration for the RAN slice manager.
//!
//! Takes northbound slice operations (create, update, delete a slice; bind
//! or unbind a UE) addressed to a RAN node, serializes them per node, and
//! drives each to completion against the RAN and the state stores before
//! answering the caller.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator
//!   ├── validate + NodeDirectory::resolve (fail fast, nothing queued)
//!   ├── NodeQueues (one bounded FIFO + one worker task per node)
//!   │   └── NodeWorker
//!   │       ├── NodeDirectory (node still present?)
//!   │       ├── SliceStore (slice lifecycle state)
//!   │       ├── RanProgrammer (add / update / remove on the node)
//!   │       └── UeAssociationStore (bind, unbind, cascade on delete)
//!   └── watch_nodes (detach queues of removed nodes)
//! ```
//!
//! Operations on one node execute one at a time in arrival order; nodes
//! never wait on each other. A caller's deadline only bounds how long it
//! waits: an enqueued operation always runs.

pub mod error;
pub mod operation;
pub mod orchestrator;
pub mod queue;
pub mod ran;
pub mod store;
mod worker;

#[cfg(test)]
mod testing;

pub use error::{SliceError, SliceResult};
pub use operation::{OperationKind, SliceRequest};
pub use orchestrator::{Collaborators, Orchestrator, OrchestratorConfig};
pub use queue::QueueStats;
pub use ran::{LoopbackRan, RanAck, RanOp, RanProgrammer};
pub use store::{SliceStore, UeAssociationStore};
