//! Node worker — drains one node's queue strictly in arrival order.
//!
//! A worker is the only task that executes operations for its node, so the
//! read-check-write sequences below never interleave with another operation
//! on the same node. Each operation runs to completion once dequeued, even if
//! its submitter has stopped waiting.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use rsm_state::{Slice, SliceParams, SliceState, UeSliceAssociation};
use rsm_topo::NodeDirectory;

use crate::error::{SliceError, SliceResult};
use crate::operation::{Operation, SliceRequest};
use crate::ran::{RanOp, RanProgrammer};
use crate::store::{SliceStore, UeAssociationStore};

/// Everything a worker needs to execute operations. Shared by all workers.
pub(crate) struct WorkerContext {
    pub directory: Arc<dyn NodeDirectory>,
    pub slices: Arc<dyn SliceStore>,
    pub associations: Arc<dyn UeAssociationStore>,
    pub ran: Arc<dyn RanProgrammer>,
    /// Whether a `Deleted` tombstone may be replaced by a new `Create`.
    pub slice_id_reuse: bool,
}

/// The single consumer of one node's queue.
pub(crate) struct NodeWorker {
    node_id: String,
    rx: mpsc::Receiver<Operation>,
    ctx: Arc<WorkerContext>,
}

impl NodeWorker {
    pub fn new(node_id: String, rx: mpsc::Receiver<Operation>, ctx: Arc<WorkerContext>) -> Self {
        Self { node_id, rx, ctx }
    }

    /// Run until every sender is gone and the queue is empty.
    pub async fn run(mut self) {
        debug!(node_id = %self.node_id, "node worker started");

        while let Some(op) = self.rx.recv().await {
            let kind = op.request.kind();
            let result = self.execute(&op.node_id, op.request).await;

            match &result {
                Ok(()) => debug!(node_id = %op.node_id, %kind, "operation completed"),
                Err(e) => warn!(
                    node_id = %op.node_id,
                    %kind,
                    code = e.code(),
                    error = %e,
                    "operation failed"
                ),
            }

            if op.done.send(result).is_err() {
                debug!(node_id = %op.node_id, %kind, "submitter stopped waiting, result dropped");
            }
        }

        debug!(node_id = %self.node_id, "node worker stopped");
    }

    async fn execute(&self, node_id: &str, request: SliceRequest) -> SliceResult<()> {
        // The node may have left since the operation was queued.
        if !self.ctx.directory.resolve(node_id).await? {
            return Err(SliceError::NodeNotFound(node_id.to_string()));
        }

        match request {
            SliceRequest::Create { slice_id, params } => {
                self.create_slice(node_id, &slice_id, params).await
            }
            SliceRequest::Update { slice_id, params } => {
                self.update_slice(node_id, &slice_id, params).await
            }
            SliceRequest::Delete { slice_id } => self.delete_slice(node_id, &slice_id).await,
            SliceRequest::SetUeAssociation {
                ue_id,
                slice_id,
                drb_id,
            } => self.set_association(node_id, &ue_id, &slice_id, drb_id).await,
            SliceRequest::ResetUeAssociation { ue_id } => {
                self.reset_association(node_id, &ue_id).await
            }
        }
    }

    async fn create_slice(
        &self,
        node_id: &str,
        slice_id: &str,
        params: SliceParams,
    ) -> SliceResult<()> {
        if let Some(existing) = self.ctx.slices.get_slice(node_id, slice_id).await? {
            if existing.state.is_live() || !self.ctx.slice_id_reuse {
                return Err(SliceError::AlreadyExists {
                    node_id: node_id.to_string(),
                    slice_id: slice_id.to_string(),
                });
            }
        }

        let now = epoch_secs();
        let mut slice = Slice {
            node_id: node_id.to_string(),
            slice_id: slice_id.to_string(),
            params,
            state: SliceState::Pending,
            failure_cause: None,
            created_at: now,
            updated_at: now,
        };
        self.ctx.slices.put_slice(&slice).await?;

        let ack = self
            .ctx
            .ran
            .program(node_id, slice_id, &slice.params, RanOp::Add)
            .await;

        if ack.ack {
            self.transition(&mut slice, SliceState::Active).await?;
            info!(%node_id, %slice_id, "slice created");
            Ok(())
        } else {
            let cause = ran_cause(ack.cause);
            slice.failure_cause = Some(cause.clone());
            self.transition(&mut slice, SliceState::Failed).await?;
            Err(SliceError::RanRejected(cause))
        }
    }

    async fn update_slice(
        &self,
        node_id: &str,
        slice_id: &str,
        params: SliceParams,
    ) -> SliceResult<()> {
        let mut slice = self.active_slice(node_id, slice_id).await?;
        self.transition(&mut slice, SliceState::Updating).await?;

        let ack = self
            .ctx
            .ran
            .program(node_id, slice_id, &params, RanOp::Update)
            .await;

        if ack.ack {
            slice.params = params;
            slice.failure_cause = None;
            self.transition(&mut slice, SliceState::Active).await?;
            info!(%node_id, %slice_id, "slice updated");
            Ok(())
        } else {
            let cause = ran_cause(ack.cause);
            slice.failure_cause = Some(cause.clone());
            self.transition(&mut slice, SliceState::Failed).await?;
            // Associations may only point at active slices.
            let unbound = self
                .ctx
                .associations
                .delete_by_node_slice(node_id, slice_id)
                .await?;
            warn!(%node_id, %slice_id, unbound, %cause, "slice failed after rejected update");
            Err(SliceError::RanRejected(cause))
        }
    }

    async fn delete_slice(&self, node_id: &str, slice_id: &str) -> SliceResult<()> {
        let mut slice = match self.ctx.slices.get_slice(node_id, slice_id).await? {
            Some(slice) if slice.state.is_live() => slice,
            _ => return Err(slice_not_found(node_id, slice_id)),
        };
        let prior = slice.state;
        self.transition(&mut slice, SliceState::Deleting).await?;

        let ack = self
            .ctx
            .ran
            .program(node_id, slice_id, &slice.params, RanOp::Remove)
            .await;

        if !ack.ack {
            // Still installed on the node; put the record back as it was.
            self.transition(&mut slice, prior).await?;
            return Err(SliceError::RanRejected(ran_cause(ack.cause)));
        }

        let unbound = self
            .ctx
            .associations
            .delete_by_node_slice(node_id, slice_id)
            .await?;
        self.transition(&mut slice, SliceState::Deleted).await?;
        info!(%node_id, %slice_id, unbound, "slice deleted");
        Ok(())
    }

    async fn set_association(
        &self,
        node_id: &str,
        ue_id: &str,
        slice_id: &str,
        drb_id: Option<u32>,
    ) -> SliceResult<()> {
        self.active_slice(node_id, slice_id).await?;

        let assoc = UeSliceAssociation {
            node_id: node_id.to_string(),
            ue_id: ue_id.to_string(),
            slice_id: slice_id.to_string(),
            drb_id,
            associated_at: epoch_secs(),
        };
        self.ctx.associations.put(&assoc).await?;
        info!(%node_id, %ue_id, %slice_id, "ue associated with slice");
        Ok(())
    }

    async fn reset_association(&self, node_id: &str, ue_id: &str) -> SliceResult<()> {
        if !self.ctx.associations.delete(node_id, ue_id).await? {
            return Err(SliceError::NotFound(format!(
                "ue {ue_id} has no slice association on node {node_id}"
            )));
        }
        info!(%node_id, %ue_id, "ue slice association reset");
        Ok(())
    }

    /// Fetch a slice that must currently be `Active`.
    async fn active_slice(&self, node_id: &str, slice_id: &str) -> SliceResult<Slice> {
        match self.ctx.slices.get_slice(node_id, slice_id).await? {
            Some(slice) if slice.state == SliceState::Active => Ok(slice),
            _ => Err(slice_not_found(node_id, slice_id)),
        }
    }

    async fn transition(&self, slice: &mut Slice, to: SliceState) -> SliceResult<()> {
        debug!(
            node_id = %slice.node_id,
            slice_id = %slice.slice_id,
            from = ?slice.state,
            ?to,
            "slice state transition"
        );
        slice.state = to;
        slice.updated_at = epoch_secs();
        self.ctx.slices.put_slice(slice).await?;
        Ok(())
    }
}

fn slice_not_found(node_id: &str, slice_id: &str) -> SliceError {
    SliceError::NotFound(format!("no active slice {slice_id} on node {node_id}"))
}

/// A rejection always carries a cause, even when the node sent none.
fn ran_cause(cause: String) -> String {
    if cause.trim().is_empty() {
        "rejected by RAN without a cause".to_string()
    } else {
        cause
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
