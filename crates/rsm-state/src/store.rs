//! StateStore — redb-backed persistence for the slice manager.
//!
//! Provides typed CRUD operations over slices, UE associations and nodes.
//! All values are JSON-serialized into redb's `&[u8]` value columns. The
//! store supports both on-disk and in-memory backends (the latter for
//! testing).
//!
//! Every mutation runs in its own write transaction; redb serializes write
//! transactions, which gives read-modify-write safety per call.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

type JsonTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(SLICES).map_err(map_err!(Table))?;
        txn.open_table(UE_ASSOCIATIONS).map_err(map_err!(Table))?;
        txn.open_table(NODES).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Slices ─────────────────────────────────────────────────────

    /// Insert or update a slice record.
    pub fn put_slice(&self, slice: &Slice) -> StateResult<()> {
        let key = slice.table_key();
        self.put_value(SLICES, &key, slice)?;
        debug!(%key, state = ?slice.state, "slice stored");
        Ok(())
    }

    /// Get a slice by node and slice ID.
    pub fn get_slice(&self, node_id: &str, slice_id: &str) -> StateResult<Option<Slice>> {
        self.get_value(SLICES, &slice_key(node_id, slice_id))
    }

    /// List every slice record (tombstones included) for a node.
    pub fn list_slices_for_node(&self, node_id: &str) -> StateResult<Vec<Slice>> {
        self.scan_prefix(SLICES, &format!("{node_id}/"))
    }

    // ── UE associations ────────────────────────────────────────────

    /// Insert or overwrite the association of a UE on a node.
    pub fn put_association(&self, assoc: &UeSliceAssociation) -> StateResult<()> {
        let key = assoc.table_key();
        self.put_value(UE_ASSOCIATIONS, &key, assoc)?;
        debug!(%key, slice_id = %assoc.slice_id, "ue association stored");
        Ok(())
    }

    /// Get the association of a UE on a node.
    pub fn get_association(
        &self,
        node_id: &str,
        ue_id: &str,
    ) -> StateResult<Option<UeSliceAssociation>> {
        self.get_value(UE_ASSOCIATIONS, &association_key(node_id, ue_id))
    }

    /// List all UE associations on a node.
    pub fn list_associations_for_node(
        &self,
        node_id: &str,
    ) -> StateResult<Vec<UeSliceAssociation>> {
        self.scan_prefix(UE_ASSOCIATIONS, &format!("{node_id}/"))
    }

    /// Delete the association of a UE on a node. Returns true if it existed.
    pub fn delete_association(&self, node_id: &str, ue_id: &str) -> StateResult<bool> {
        let key = association_key(node_id, ue_id);
        let existed = self.delete_key(UE_ASSOCIATIONS, &key)?;
        debug!(%key, existed, "ue association deleted");
        Ok(existed)
    }

    /// Delete every association on `node_id` bound to `slice_id`.
    ///
    /// Scan and removal happen in one write transaction so an association
    /// written concurrently cannot slip between them. Returns the number
    /// removed.
    pub fn delete_associations_for_slice(
        &self,
        node_id: &str,
        slice_id: &str,
    ) -> StateResult<u32> {
        let prefix = format!("{node_id}/");
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let count;
        {
            let mut table = txn.open_table(UE_ASSOCIATIONS).map_err(map_err!(Table))?;
            let mut doomed = Vec::new();
            for entry in table.iter().map_err(map_err!(Read))? {
                let (key, value) = entry.map_err(map_err!(Read))?;
                if !key.value().starts_with(&prefix) {
                    continue;
                }
                let assoc: UeSliceAssociation =
                    serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                if assoc.slice_id == slice_id {
                    doomed.push(key.value().to_string());
                }
            }
            for key in &doomed {
                table.remove(key.as_str()).map_err(map_err!(Write))?;
            }
            count = doomed.len() as u32;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%node_id, %slice_id, removed = count, "slice associations deleted");
        Ok(count)
    }

    // ── Nodes ──────────────────────────────────────────────────────

    /// Insert or update a node.
    pub fn put_node(&self, node: &NodeInfo) -> StateResult<()> {
        self.put_value(NODES, &node.id, node)
    }

    /// Get a node by ID.
    pub fn get_node(&self, node_id: &str) -> StateResult<Option<NodeInfo>> {
        self.get_value(NODES, node_id)
    }

    /// List all nodes.
    pub fn list_nodes(&self) -> StateResult<Vec<NodeInfo>> {
        self.scan_prefix(NODES, "")
    }

    /// Delete a node by ID. Returns true if it existed.
    pub fn delete_node(&self, node_id: &str) -> StateResult<bool> {
        self.delete_key(NODES, node_id)
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn put_value<T: Serialize>(&self, def: JsonTable, key: &str, value: &T) -> StateResult<()> {
        let bytes = serde_json::to_vec(value).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(def).map_err(map_err!(Table))?;
            table
                .insert(key, bytes.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    fn get_value<T: DeserializeOwned>(&self, def: JsonTable, key: &str) -> StateResult<Option<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(def).map_err(map_err!(Table))?;
        match table.get(key).map_err(map_err!(Read))? {
            Some(guard) => {
                let value = serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn scan_prefix<T: DeserializeOwned>(
        &self,
        def: JsonTable,
        prefix: &str,
    ) -> StateResult<Vec<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(def).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            if key.value().starts_with(prefix) {
                results.push(serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?);
            }
        }
        Ok(results)
    }

    fn delete_key(&self, def: JsonTable, key: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(def).map_err(map_err!(Table))?;
            existed = table.remove(key).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(existed)
    }
}
