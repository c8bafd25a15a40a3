//! Per-node queue registry.
//!
//! Owns one bounded FIFO and one worker task per node. Queues are created
//! lazily on first use and detached when the node leaves the topology; a
//! detached worker drains what is already queued and exits on its own.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use rsm_state::NodeId;

use crate::error::{SliceError, SliceResult};
use crate::operation::Operation;
use crate::worker::{NodeWorker, WorkerContext};

/// Queue depth snapshot for one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub node_id: NodeId,
    /// Operations waiting behind the one in execution.
    pub queued: usize,
    pub capacity: usize,
}

struct NodeQueue {
    tx: mpsc::Sender<Operation>,
    handle: JoinHandle<()>,
}

pub(crate) struct NodeQueues {
    queues: RwLock<HashMap<NodeId, NodeQueue>>,
    /// Workers of detached nodes that may still be draining.
    retired: Mutex<Vec<JoinHandle<()>>>,
    /// Set by `shutdown`; no queue is created afterwards.
    closed: AtomicBool,
    capacity: usize,
    ctx: Arc<WorkerContext>,
}

impl NodeQueues {
    pub fn new(capacity: usize, ctx: Arc<WorkerContext>) -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
            retired: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            capacity: capacity.max(1),
            ctx,
        }
    }

    /// Sender for `node_id`'s queue, spawning its worker on first use.
    ///
    /// A new queue is only created while the directory still knows the node.
    /// The check runs under the registry write lock, so a removal observed by
    /// `detach` is either seen here or detaches the queue created here.
    pub async fn sender(&self, node_id: &str) -> SliceResult<mpsc::Sender<Operation>> {
        {
            let queues = self.queues.read().await;
            if let Some(queue) = queues.get(node_id) {
                return Ok(queue.tx.clone());
            }
        }

        let mut queues = self.queues.write().await;
        if self.closed.load(Ordering::Acquire) {
            return Err(SliceError::Internal("orchestrator is shut down".to_string()));
        }
        if let Some(queue) = queues.get(node_id) {
            return Ok(queue.tx.clone());
        }
        if !self.ctx.directory.resolve(node_id).await? {
            debug!(%node_id, "node removed before its queue was created");
            return Err(SliceError::NodeNotFound(node_id.to_string()));
        }

        let (tx, rx) = mpsc::channel(self.capacity);
        let worker = NodeWorker::new(node_id.to_string(), rx, Arc::clone(&self.ctx));
        let handle = tokio::spawn(worker.run());
        info!(%node_id, capacity = self.capacity, "node queue created");
        queues.insert(
            node_id.to_string(),
            NodeQueue {
                tx: tx.clone(),
                handle,
            },
        );
        Ok(tx)
    }

    /// Detach a node's queue. Returns true if one existed.
    pub async fn detach(&self, node_id: &str) -> bool {
        let queue = self.queues.write().await.remove(node_id);
        match queue {
            Some(queue) => {
                let queued = self.capacity - queue.tx.capacity();
                // Dropping the last registry sender lets the worker finish
                // once the queue is empty.
                drop(queue.tx);
                let mut retired = self.retired.lock().await;
                retired.retain(|h| !h.is_finished());
                retired.push(queue.handle);
                info!(%node_id, queued, "node queue detached");
                true
            }
            None => false,
        }
    }

    /// Nodes that currently own a queue.
    pub async fn nodes(&self) -> Vec<NodeId> {
        self.queues.read().await.keys().cloned().collect()
    }

    pub async fn stats(&self) -> Vec<QueueStats> {
        let queues = self.queues.read().await;
        let mut stats: Vec<QueueStats> = queues
            .iter()
            .map(|(node_id, queue)| QueueStats {
                node_id: node_id.clone(),
                queued: self.capacity - queue.tx.capacity(),
                capacity: self.capacity,
            })
            .collect();
        stats.sort_by(|a, b| a.node_id.cmp(&b.node_id));
        stats
    }

    /// Close every queue, refuse new ones, and wait for the workers to drain.
    pub async fn shutdown(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut queues = self.queues.write().await;
            self.closed.store(true, Ordering::Release);
            queues.drain().map(|(_, queue)| queue.handle).collect()
        };
        let retired: Vec<JoinHandle<()>> = self.retired.lock().await.drain(..).collect();

        let count = handles.len() + retired.len();
        for handle in handles.into_iter().chain(retired) {
            let _ = handle.await;
        }
        debug!(workers = count, "node workers drained");
    }
}
