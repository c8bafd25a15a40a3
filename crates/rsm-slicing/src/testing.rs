//! Test doubles shared by the unit tests in this crate.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{Notify, broadcast, mpsc, watch};

use rsm_state::{SliceParams, StateStore};
use rsm_topo::{DirectoryResult, NodeDirectory, NodeEvent, TopoRegistry};

use crate::ran::{RanAck, RanOp, RanProgrammer};

/// Topology registry over `store` with `nodes` already registered.
pub(crate) fn test_topology(store: &StateStore, nodes: &[&str]) -> Arc<TopoRegistry> {
    let topo = Arc::new(TopoRegistry::new(store.clone()));
    for node in nodes {
        topo.register(node, "127.0.0.1:36421", BTreeMap::new())
            .unwrap();
    }
    topo
}

/// Scriptable RAN: records calls, rejects chosen slices, and can hold calls
/// for chosen nodes until released.
pub(crate) struct FakeRan {
    calls: Mutex<Vec<(String, String, RanOp)>>,
    rejects: Mutex<HashMap<(String, RanOp), String>>,
    held: Mutex<HashSet<String>>,
    open: watch::Sender<bool>,
    entered_tx: mpsc::UnboundedSender<String>,
    entered_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>,
}

impl FakeRan {
    pub fn new() -> Self {
        let (open, _) = watch::channel(false);
        let (entered_tx, entered_rx) = mpsc::unbounded_channel();
        Self {
            calls: Mutex::new(Vec::new()),
            rejects: Mutex::new(HashMap::new()),
            held: Mutex::new(HashSet::new()),
            open,
            entered_tx,
            entered_rx: tokio::sync::Mutex::new(entered_rx),
        }
    }

    /// Answer `op` on `slice_id` with a rejection carrying `cause`.
    pub fn reject(&self, slice_id: &str, op: RanOp, cause: &str) {
        self.rejects
            .lock()
            .unwrap()
            .insert((slice_id.to_string(), op), cause.to_string());
    }

    /// Block calls for `node_id` until `release` is called.
    pub fn hold(&self, node_id: &str) {
        self.held.lock().unwrap().insert(node_id.to_string());
    }

    pub fn release(&self) {
        self.open.send_replace(true);
    }

    /// Wait until a held call has started; returns its slice ID.
    pub async fn wait_entered(&self) -> String {
        self.entered_rx.lock().await.recv().await.unwrap()
    }

    pub fn calls(&self) -> Vec<(String, String, RanOp)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RanProgrammer for FakeRan {
    async fn program(
        &self,
        node_id: &str,
        slice_id: &str,
        _params: &SliceParams,
        op: RanOp,
    ) -> RanAck {
        self.calls
            .lock()
            .unwrap()
            .push((node_id.to_string(), slice_id.to_string(), op));

        let held = self.held.lock().unwrap().contains(node_id);
        if held {
            let mut open = self.open.subscribe();
            let _ = self.entered_tx.send(slice_id.to_string());
            let _ = open.wait_for(|open| *open).await;
        }

        let reject = self
            .rejects
            .lock()
            .unwrap()
            .get(&(slice_id.to_string(), op))
            .cloned();
        match reject {
            Some(cause) => RanAck::rejected(cause),
            None => RanAck::accepted(),
        }
    }
}

/// Directory over a `TopoRegistry` that can pause one lookup of a chosen
/// node after it has answered, until released.
pub(crate) struct GatedDirectory {
    inner: Arc<TopoRegistry>,
    armed: Mutex<Option<String>>,
    open: watch::Sender<bool>,
    entered: Notify,
}

impl GatedDirectory {
    pub fn new(inner: Arc<TopoRegistry>) -> Self {
        Self {
            inner,
            armed: Mutex::new(None),
            open: watch::Sender::new(false),
            entered: Notify::new(),
        }
    }

    /// Pause the next lookup of `node_id`.
    pub fn arm(&self, node_id: &str) {
        *self.armed.lock().unwrap() = Some(node_id.to_string());
    }

    /// Wait until the armed lookup has answered and is paused.
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.open.send_replace(true);
    }
}

#[async_trait]
impl NodeDirectory for GatedDirectory {
    async fn resolve(&self, node_id: &str) -> DirectoryResult<bool> {
        let found = self.inner.resolve(node_id).await?;
        let gated = {
            let mut armed = self.armed.lock().unwrap();
            if armed.as_deref() == Some(node_id) {
                armed.take();
                true
            } else {
                false
            }
        };
        if gated {
            let mut open = self.open.subscribe();
            self.entered.notify_one();
            let _ = open.wait_for(|open| *open).await;
        }
        Ok(found)
    }

    fn watch(&self) -> broadcast::Receiver<NodeEvent> {
        self.inner.watch()
    }
}
