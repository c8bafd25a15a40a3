//! Slice orchestrator — the entry point for northbound slice operations.
//!
//! The `Orchestrator`:
//! - Validates a request and resolves its target node, failing fast
//! - Enqueues it on the node's bounded FIFO (backpressure when full)
//! - Waits for the node worker's verdict, bounded by the caller deadline
//! - Tears down queues of nodes the directory reports removed

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, oneshot, watch};
use tracing::{debug, info, warn};

use rsm_state::{Slice, SliceParams, UeSliceAssociation};
use rsm_topo::{NodeDirectory, NodeEvent};

use crate::error::{SliceError, SliceResult};
use crate::operation::{validate_id, Operation, SliceRequest};
use crate::queue::{NodeQueues, QueueStats};
use crate::ran::RanProgrammer;
use crate::store::{SliceStore, UeAssociationStore};
use crate::worker::WorkerContext;

/// Tunables for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum operations waiting per node before `Overloaded`.
    pub queue_capacity: usize,
    /// How long `submit` waits for a result by default.
    pub request_timeout: Duration,
    /// Whether a deleted slice ID may be created again.
    pub slice_id_reuse: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            request_timeout: Duration::from_secs(30),
            slice_id_reuse: true,
        }
    }
}

/// The external systems the orchestrator coordinates.
pub struct Collaborators {
    pub directory: Arc<dyn NodeDirectory>,
    pub slices: Arc<dyn SliceStore>,
    pub associations: Arc<dyn UeAssociationStore>,
    pub ran: Arc<dyn RanProgrammer>,
}

/// Serializes slice operations per RAN node and drives them to completion.
///
/// Starts with no queues; a node's queue appears on its first operation and
/// goes away when the directory reports the node removed.
pub struct Orchestrator {
    directory: Arc<dyn NodeDirectory>,
    slices: Arc<dyn SliceStore>,
    associations: Arc<dyn UeAssociationStore>,
    queues: NodeQueues,
    config: OrchestratorConfig,
    /// Flipped by `shutdown` to end `watch_nodes`.
    stopped: watch::Sender<bool>,
}

impl Orchestrator {
    /// Create an orchestrator. Must be called within a tokio runtime once
    /// operations are submitted, since workers are spawned lazily.
    pub fn new(collaborators: Collaborators, config: OrchestratorConfig) -> Self {
        let ctx = Arc::new(WorkerContext {
            directory: Arc::clone(&collaborators.directory),
            slices: Arc::clone(&collaborators.slices),
            associations: Arc::clone(&collaborators.associations),
            ran: collaborators.ran,
            slice_id_reuse: config.slice_id_reuse,
        });

        Self {
            directory: collaborators.directory,
            slices: collaborators.slices,
            associations: collaborators.associations,
            queues: NodeQueues::new(config.queue_capacity, ctx),
            config,
            stopped: watch::Sender::new(false),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    // ── Northbound operations ──────────────────────────────────────

    pub async fn create_slice(
        &self,
        node_id: &str,
        slice_id: &str,
        params: SliceParams,
    ) -> SliceResult<()> {
        self.submit(
            node_id,
            SliceRequest::Create {
                slice_id: slice_id.to_string(),
                params,
            },
        )
        .await
    }

    pub async fn update_slice(
        &self,
        node_id: &str,
        slice_id: &str,
        params: SliceParams,
    ) -> SliceResult<()> {
        self.submit(
            node_id,
            SliceRequest::Update {
                slice_id: slice_id.to_string(),
                params,
            },
        )
        .await
    }

    pub async fn delete_slice(&self, node_id: &str, slice_id: &str) -> SliceResult<()> {
        self.submit(
            node_id,
            SliceRequest::Delete {
                slice_id: slice_id.to_string(),
            },
        )
        .await
    }

    pub async fn set_ue_slice_association(
        &self,
        node_id: &str,
        ue_id: &str,
        slice_id: &str,
        drb_id: Option<u32>,
    ) -> SliceResult<()> {
        self.submit(
            node_id,
            SliceRequest::SetUeAssociation {
                ue_id: ue_id.to_string(),
                slice_id: slice_id.to_string(),
                drb_id,
            },
        )
        .await
    }

    pub async fn reset_ue_slice_association(&self, node_id: &str, ue_id: &str) -> SliceResult<()> {
        self.submit(
            node_id,
            SliceRequest::ResetUeAssociation {
                ue_id: ue_id.to_string(),
            },
        )
        .await
    }

    /// Submit a request and wait up to the configured request timeout.
    pub async fn submit(&self, node_id: &str, request: SliceRequest) -> SliceResult<()> {
        self.submit_with_deadline(node_id, request, self.config.request_timeout)
            .await
    }

    /// Submit a request and wait up to `deadline` for its outcome.
    ///
    /// Once enqueued, the operation runs even if the deadline fires first or
    /// this future is dropped; only the waiting stops. After a
    /// `DeadlineExceeded`, read the slice back to learn the final state.
    pub async fn submit_with_deadline(
        &self,
        node_id: &str,
        request: SliceRequest,
        deadline: Duration,
    ) -> SliceResult<()> {
        validate_id("node_id", node_id)?;
        request.validate()?;

        if !self.directory.resolve(node_id).await? {
            debug!(%node_id, kind = %request.kind(), "rejected: unknown node");
            return Err(SliceError::NodeNotFound(node_id.to_string()));
        }

        let kind = request.kind();
        let (done, outcome) = oneshot::channel();
        let op = Operation {
            node_id: node_id.to_string(),
            request,
            done,
        };

        let tx = self.queues.sender(node_id).await?;
        match tx.try_send(op) {
            Ok(()) => debug!(%node_id, %kind, "operation queued"),
            Err(TrySendError::Full(_)) => {
                warn!(%node_id, %kind, "node queue full");
                return Err(SliceError::Overloaded(node_id.to_string()));
            }
            // Only possible if the worker task died.
            Err(TrySendError::Closed(_)) => {
                return Err(SliceError::Internal(format!(
                    "worker for node {node_id} is not running"
                )));
            }
        }
        drop(tx);

        match tokio::time::timeout(deadline, outcome).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(SliceError::Internal(format!(
                "worker for node {node_id} dropped the operation"
            ))),
            Err(_) => {
                warn!(%node_id, %kind, ?deadline, "deadline exceeded, operation left queued");
                Err(SliceError::DeadlineExceeded(deadline))
            }
        }
    }

    // ── Reads ──────────────────────────────────────────────────────

    /// Current record of a slice, tombstones included.
    pub async fn slice(&self, node_id: &str, slice_id: &str) -> SliceResult<Option<Slice>> {
        Ok(self.slices.get_slice(node_id, slice_id).await?)
    }

    /// Every slice record on a node, tombstones included.
    pub async fn slices(&self, node_id: &str) -> SliceResult<Vec<Slice>> {
        Ok(self.slices.list_slices(node_id).await?)
    }

    pub async fn ue_associations(&self, node_id: &str) -> SliceResult<Vec<UeSliceAssociation>> {
        Ok(self.associations.list_for_node(node_id).await?)
    }

    pub async fn ue_association(
        &self,
        node_id: &str,
        ue_id: &str,
    ) -> SliceResult<Option<UeSliceAssociation>> {
        Ok(self.associations.get(node_id, ue_id).await?)
    }

    /// Depth of every live node queue.
    pub async fn queue_stats(&self) -> Vec<QueueStats> {
        self.queues.stats().await
    }

    // ── Topology tracking ──────────────────────────────────────────

    /// Follow directory events until `shutdown` fires or the orchestrator is
    /// shut down, detaching the queue of every node reported removed.
    ///
    /// Queued operations of a removed node are not dropped: the worker
    /// finishes the one in flight and fails the rest with `NodeNotFound`.
    pub async fn watch_nodes(
        &self,
        mut events: broadcast::Receiver<NodeEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut stopped = self.stopped.subscribe();
        if *stopped.borrow_and_update() {
            return;
        }
        info!("node watch started");
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(NodeEvent { node_id, removed: true }) => {
                        self.queues.detach(&node_id).await;
                    }
                    Ok(NodeEvent { node_id, removed: false }) => {
                        debug!(%node_id, "node added; queue created on first operation");
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "node events lagged, reconciling queues");
                        self.reconcile().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("node directory closed its event stream");
                        break;
                    }
                },
                _ = shutdown.changed() => {
                    debug!("node watch shutting down");
                    break;
                }
                _ = stopped.changed() => {
                    debug!("orchestrator stopped, node watch exiting");
                    break;
                }
            }
        }
    }

    /// Detach queues of nodes the directory no longer knows.
    async fn reconcile(&self) {
        for node_id in self.queues.nodes().await {
            match self.directory.resolve(&node_id).await {
                Ok(true) => {}
                Ok(false) => {
                    self.queues.detach(&node_id).await;
                }
                Err(e) => warn!(%node_id, error = %e, "resolve failed during reconcile"),
            }
        }
    }

    /// Stop the node watch, refuse further operations, and wait for the
    /// queued ones to drain.
    pub async fn shutdown(&self) {
        self.stopped.send_replace(true);
        self.queues.shutdown().await;
        info!("orchestrator stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_topology, FakeRan, GatedDirectory};
    use rsm_state::{SliceState, StateStore};
    use rsm_topo::TopoRegistry;

    struct Harness {
        orch: Arc<Orchestrator>,
        topo: Arc<TopoRegistry>,
        ran: Arc<FakeRan>,
        store: StateStore,
    }

    fn harness(queue_capacity: usize) -> Harness {
        let store = StateStore::open_in_memory().unwrap();
        let topo = test_topology(&store, &["n1", "n2"]);
        let ran = Arc::new(FakeRan::new());
        let orch = Orchestrator::new(
            Collaborators {
                directory: topo.clone(),
                slices: Arc::new(store.clone()),
                associations: Arc::new(store.clone()),
                ran: ran.clone(),
            },
            OrchestratorConfig {
                queue_capacity,
                request_timeout: Duration::from_secs(5),
                slice_id_reuse: true,
            },
        );
        Harness {
            orch: Arc::new(orch),
            topo,
            ran,
            store,
        }
    }

    fn params(weight: u32) -> SliceParams {
        SliceParams {
            weight,
            ..SliceParams::default()
        }
    }

    /// Poll until `node_id` has `queued` operations waiting.
    async fn wait_queued(orch: &Orchestrator, node_id: &str, queued: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let depth = orch
                    .queue_stats()
                    .await
                    .into_iter()
                    .find(|s| s.node_id == node_id)
                    .map(|s| s.queued);
                if depth == Some(queued) {
                    return;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("queue never reached expected depth");
    }

    #[tokio::test]
    async fn create_conflict_delete_recreate_scenario() {
        let h = harness(8);

        h.orch.create_slice("n1", "s1", params(10)).await.unwrap();
        assert!(matches!(
            h.orch.create_slice("n1", "s1", params(20)).await,
            Err(SliceError::AlreadyExists { .. })
        ));
        h.orch.delete_slice("n1", "s1").await.unwrap();
        h.orch.create_slice("n1", "s1", params(20)).await.unwrap();

        let slice = h.orch.slice("n1", "s1").await.unwrap().unwrap();
        assert_eq!(slice.state, SliceState::Active);
        assert_eq!(slice.params.weight, 20);
    }

    #[tokio::test]
    async fn association_before_and_after_slice_exists() {
        let h = harness(8);

        assert!(matches!(
            h.orch.set_ue_slice_association("n1", "ue1", "s1", None).await,
            Err(SliceError::NotFound(_))
        ));
        h.orch.create_slice("n1", "s1", params(10)).await.unwrap();
        h.orch
            .set_ue_slice_association("n1", "ue1", "s1", None)
            .await
            .unwrap();

        let assoc = h.orch.ue_association("n1", "ue1").await.unwrap().unwrap();
        assert_eq!(assoc.slice_id, "s1");
    }

    #[tokio::test]
    async fn concurrent_duplicate_creates_follow_submission_order() {
        let h = harness(8);

        let (first, second) = tokio::join!(
            h.orch.create_slice("n1", "s1", params(10)),
            h.orch.create_slice("n1", "s1", params(20)),
        );
        assert!(first.is_ok());
        assert!(matches!(second, Err(SliceError::AlreadyExists { .. })));

        let slice = h.orch.slice("n1", "s1").await.unwrap().unwrap();
        assert_eq!(slice.params.weight, 10);
    }

    #[tokio::test]
    async fn queued_duplicate_create_loses_to_earlier_one() {
        let h = harness(8);
        h.ran.hold("n1");

        let orch = h.orch.clone();
        let first = tokio::spawn(async move { orch.create_slice("n1", "s1", params(10)).await });
        assert_eq!(h.ran.wait_entered().await, "s1");

        let orch = h.orch.clone();
        let second = tokio::spawn(async move { orch.create_slice("n1", "s1", params(20)).await });
        wait_queued(&h.orch, "n1", 1).await;

        h.ran.release();
        assert!(first.await.unwrap().is_ok());
        assert!(matches!(
            second.await.unwrap(),
            Err(SliceError::AlreadyExists { .. })
        ));
    }

    #[tokio::test]
    async fn delete_then_create_in_fifo_order() {
        let h = harness(8);
        h.orch.create_slice("n1", "s1", params(10)).await.unwrap();

        let (deleted, created) = tokio::join!(
            h.orch.delete_slice("n1", "s1"),
            h.orch.create_slice("n1", "s1", params(30)),
        );
        deleted.unwrap();
        created.unwrap();
        assert_eq!(
            h.orch.slice("n1", "s1").await.unwrap().unwrap().state,
            SliceState::Active
        );
    }

    #[tokio::test]
    async fn delete_removes_every_bound_association() {
        let h = harness(8);
        h.orch.create_slice("n1", "s1", params(10)).await.unwrap();
        for ue in ["ue1", "ue2", "ue3"] {
            h.orch
                .set_ue_slice_association("n1", ue, "s1", None)
                .await
                .unwrap();
        }

        h.orch.delete_slice("n1", "s1").await.unwrap();
        assert!(h.orch.ue_associations("n1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn association_queued_behind_failing_create_is_not_found() {
        let h = harness(8);
        h.ran.hold("n1");

        let orch = h.orch.clone();
        let create = tokio::spawn(async move { orch.create_slice("n1", "s1", params(10)).await });
        h.ran.wait_entered().await;
        assert_eq!(
            h.store.get_slice("n1", "s1").unwrap().unwrap().state,
            SliceState::Pending
        );

        // Queued behind the create, but checked against the state the
        // create leaves behind.
        h.ran.reject("s1", crate::ran::RanOp::Add, "admission refused");
        let orch = h.orch.clone();
        let assoc = tokio::spawn(async move {
            orch.set_ue_slice_association("n1", "ue1", "s1", None).await
        });
        wait_queued(&h.orch, "n1", 1).await;
        h.ran.release();

        assert!(matches!(
            create.await.unwrap(),
            Err(SliceError::RanRejected(_))
        ));
        assert!(matches!(assoc.await.unwrap(), Err(SliceError::NotFound(_))));
    }

    #[tokio::test]
    async fn association_against_pending_record_is_not_found() {
        let h = harness(8);
        h.store
            .put_slice(&Slice {
                node_id: "n1".into(),
                slice_id: "s1".into(),
                params: params(10),
                state: SliceState::Pending,
                failure_cause: None,
                created_at: 1000,
                updated_at: 1000,
            })
            .unwrap();

        assert!(matches!(
            h.orch.set_ue_slice_association("n1", "ue1", "s1", None).await,
            Err(SliceError::NotFound(_))
        ));
        assert!(h.orch.ue_association("n1", "ue1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn slow_node_does_not_block_other_nodes() {
        let h = harness(8);
        h.ran.hold("n1");

        let orch = h.orch.clone();
        let slow = tokio::spawn(async move { orch.create_slice("n1", "s1", params(10)).await });
        h.ran.wait_entered().await;

        tokio::time::timeout(
            Duration::from_secs(1),
            h.orch.create_slice("n2", "s1", params(10)),
        )
        .await
        .expect("n2 was blocked behind n1")
        .unwrap();
        assert!(!slow.is_finished());

        h.ran.release();
        slow.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn unknown_node_fails_fast_without_queue() {
        let h = harness(8);
        assert!(matches!(
            h.orch.create_slice("n9", "s1", params(10)).await,
            Err(SliceError::NodeNotFound(_))
        ));
        assert!(h.orch.queue_stats().await.is_empty());
    }

    #[tokio::test]
    async fn validation_happens_before_queueing() {
        let h = harness(8);
        assert!(matches!(
            h.orch.create_slice("n1", "", params(10)).await,
            Err(SliceError::Validation(_))
        ));
        assert!(matches!(
            h.orch.set_ue_slice_association("n1", "", "s1", None).await,
            Err(SliceError::Validation(_))
        ));
        assert!(matches!(
            h.orch.delete_slice("", "s1").await,
            Err(SliceError::Validation(_))
        ));
        assert!(h.orch.queue_stats().await.is_empty());
        assert!(h.ran.calls().is_empty());
    }

    #[tokio::test]
    async fn full_queue_reports_overloaded() {
        let h = harness(1);
        h.ran.hold("n1");

        let orch = h.orch.clone();
        let running = tokio::spawn(async move { orch.create_slice("n1", "s1", params(1)).await });
        h.ran.wait_entered().await;

        let orch = h.orch.clone();
        let queued = tokio::spawn(async move { orch.create_slice("n1", "s2", params(1)).await });
        wait_queued(&h.orch, "n1", 1).await;

        let err = h.orch.create_slice("n1", "s3", params(1)).await.unwrap_err();
        assert_eq!(err, SliceError::Overloaded("n1".into()));
        assert!(err.is_retryable());

        // Other nodes are unaffected.
        h.orch.create_slice("n2", "s3", params(1)).await.unwrap();

        h.ran.release();
        running.await.unwrap().unwrap();
        queued.await.unwrap().unwrap();
        assert!(h.orch.slice("n1", "s3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deadline_exceeded_still_applies_operation() {
        let h = harness(8);
        h.ran.hold("n1");

        let err = h
            .orch
            .submit_with_deadline(
                "n1",
                SliceRequest::Create {
                    slice_id: "s1".into(),
                    params: params(10),
                },
                Duration::from_millis(20),
            )
            .await
            .unwrap_err();
        assert_eq!(err, SliceError::DeadlineExceeded(Duration::from_millis(20)));

        h.ran.release();
        // FIFO: this waits for the timed-out create and then conflicts with it.
        assert!(matches!(
            h.orch.create_slice("n1", "s1", params(10)).await,
            Err(SliceError::AlreadyExists { .. })
        ));
        assert_eq!(
            h.orch.slice("n1", "s1").await.unwrap().unwrap().state,
            SliceState::Active
        );
    }

    #[tokio::test]
    async fn dropped_submitter_does_not_cancel_operation() {
        let h = harness(8);
        h.ran.hold("n1");

        let orch = h.orch.clone();
        let submit = tokio::spawn(async move { orch.create_slice("n1", "s1", params(10)).await });
        h.ran.wait_entered().await;
        submit.abort();

        h.ran.release();
        h.orch.update_slice("n1", "s1", params(11)).await.unwrap();
    }

    #[tokio::test]
    async fn removed_node_drains_queue_with_node_not_found() {
        let h = harness(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let watcher = {
            let orch = h.orch.clone();
            let events = h.topo.watch();
            tokio::spawn(async move { orch.watch_nodes(events, shutdown_rx).await })
        };
        h.ran.hold("n1");

        let orch = h.orch.clone();
        let in_flight = tokio::spawn(async move { orch.create_slice("n1", "s1", params(1)).await });
        h.ran.wait_entered().await;

        let orch = h.orch.clone();
        let queued = tokio::spawn(async move { orch.create_slice("n1", "s2", params(1)).await });
        wait_queued(&h.orch, "n1", 1).await;

        h.topo.remove("n1").unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            while h.orch.queue_stats().await.iter().any(|s| s.node_id == "n1") {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("queue for removed node was not detached");

        h.ran.release();
        assert!(in_flight.await.unwrap().is_ok());
        assert_eq!(
            queued.await.unwrap(),
            Err(SliceError::NodeNotFound("n1".into()))
        );
        assert_eq!(
            h.orch.create_slice("n1", "s3", params(1)).await,
            Err(SliceError::NodeNotFound("n1".into()))
        );

        shutdown_tx.send(true).unwrap();
        watcher.await.unwrap();
    }

    #[tokio::test]
    async fn readded_node_gets_fresh_queue() {
        let h = harness(8);
        h.orch.create_slice("n1", "s1", params(1)).await.unwrap();

        h.topo.remove("n1").unwrap();
        h.orch.queues.detach("n1").await;
        h.topo
            .register("n1", "127.0.0.1:36421", Default::default())
            .unwrap();

        h.orch.create_slice("n1", "s2", params(1)).await.unwrap();
        assert_eq!(h.orch.queue_stats().await.len(), 1);
    }

    #[tokio::test]
    async fn node_removed_during_submit_leaves_no_queue() {
        let store = StateStore::open_in_memory().unwrap();
        let topo = test_topology(&store, &["n1"]);
        let directory = Arc::new(GatedDirectory::new(topo.clone()));
        let orch = Arc::new(Orchestrator::new(
            Collaborators {
                directory: directory.clone(),
                slices: Arc::new(store.clone()),
                associations: Arc::new(store),
                ran: Arc::new(FakeRan::new()),
            },
            OrchestratorConfig::default(),
        ));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let watcher = {
            let orch = orch.clone();
            let events = directory.watch();
            tokio::spawn(async move { orch.watch_nodes(events, shutdown_rx).await })
        };

        // The submit's lookup answers "present", then the node goes away
        // before the queue is created.
        directory.arm("n1");
        let submit = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.create_slice("n1", "s1", params(1)).await })
        };
        directory.wait_entered().await;
        topo.remove("n1").unwrap();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        directory.release();

        assert_eq!(
            submit.await.unwrap(),
            Err(SliceError::NodeNotFound("n1".into()))
        );
        assert!(orch.queue_stats().await.is_empty());
        assert!(orch.slice("n1", "s1").await.unwrap().is_none());

        shutdown_tx.send(true).unwrap();
        watcher.await.unwrap();
    }

    #[tokio::test]
    async fn submit_after_shutdown_is_refused() {
        let h = harness(8);
        h.orch.create_slice("n1", "s1", params(1)).await.unwrap();
        h.orch.shutdown().await;

        assert!(matches!(
            h.orch.create_slice("n2", "s1", params(1)).await,
            Err(SliceError::Internal(_))
        ));
        assert!(matches!(
            h.orch.create_slice("n1", "s2", params(1)).await,
            Err(SliceError::Internal(_))
        ));
        assert!(h.orch.queue_stats().await.is_empty());
        assert!(h.orch.slice("n2", "s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn shutdown_stops_node_watch() {
        let h = harness(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let watcher = {
            let orch = h.orch.clone();
            let events = h.topo.watch();
            tokio::spawn(async move { orch.watch_nodes(events, shutdown_rx).await })
        };

        h.orch.shutdown().await;
        tokio::time::timeout(Duration::from_secs(5), watcher)
            .await
            .expect("node watch kept running after shutdown")
            .unwrap();
    }

    #[tokio::test]
    async fn shutdown_drains_workers() {
        let h = harness(8);
        h.orch.create_slice("n1", "s1", params(1)).await.unwrap();
        h.orch.create_slice("n2", "s1", params(1)).await.unwrap();

        h.orch.shutdown().await;
        assert!(h.orch.queue_stats().await.is_empty());
    }
}
