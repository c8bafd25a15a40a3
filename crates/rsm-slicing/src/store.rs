//! Store interfaces the node workers read and write through.
//!
//! Both stores must be strongly consistent per key; the workers add no
//! locking of their own across nodes. `StateStore` implements both.

use async_trait::async_trait;

use rsm_state::{Slice, StateResult, StateStore, UeSliceAssociation};

/// Registry of slice records, keyed by `(node_id, slice_id)`.
#[async_trait]
pub trait SliceStore: Send + Sync {
    async fn get_slice(&self, node_id: &str, slice_id: &str) -> StateResult<Option<Slice>>;

    async fn put_slice(&self, slice: &Slice) -> StateResult<()>;

    async fn list_slices(&self, node_id: &str) -> StateResult<Vec<Slice>>;
}

/// Registry of UE-to-slice bindings, keyed by `(node_id, ue_id)`.
#[async_trait]
pub trait UeAssociationStore: Send + Sync {
    /// Upsert; replaces any prior binding of the UE on the node.
    async fn put(&self, assoc: &UeSliceAssociation) -> StateResult<()>;

    async fn get(&self, node_id: &str, ue_id: &str) -> StateResult<Option<UeSliceAssociation>>;

    async fn delete(&self, node_id: &str, ue_id: &str) -> StateResult<bool>;

    /// Remove every binding to `slice_id` on `node_id`, returning the count.
    async fn delete_by_node_slice(&self, node_id: &str, slice_id: &str) -> StateResult<u32>;

    async fn list_for_node(&self, node_id: &str) -> StateResult<Vec<UeSliceAssociation>>;
}

#[async_trait]
impl SliceStore for StateStore {
    async fn get_slice(&self, node_id: &str, slice_id: &str) -> StateResult<Option<Slice>> {
        StateStore::get_slice(self, node_id, slice_id)
    }

    async fn put_slice(&self, slice: &Slice) -> StateResult<()> {
        StateStore::put_slice(self, slice)
    }

    async fn list_slices(&self, node_id: &str) -> StateResult<Vec<Slice>> {
        self.list_slices_for_node(node_id)
    }
}

#[async_trait]
impl UeAssociationStore for StateStore {
    async fn put(&self, assoc: &UeSliceAssociation) -> StateResult<()> {
        self.put_association(assoc)
    }

    async fn get(&self, node_id: &str, ue_id: &str) -> StateResult<Option<UeSliceAssociation>> {
        self.get_association(node_id, ue_id)
    }

    async fn delete(&self, node_id: &str, ue_id: &str) -> StateResult<bool> {
        self.delete_association(node_id, ue_id)
    }

    async fn delete_by_node_slice(&self, node_id: &str, slice_id: &str) -> StateResult<u32> {
        self.delete_associations_for_slice(node_id, slice_id)
    }

    async fn list_for_node(&self, node_id: &str) -> StateResult<Vec<UeSliceAssociation>> {
        self.list_associations_for_node(node_id)
    }
}
