//! Northbound slice requests and the queued operation wrapping them.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use rsm_state::{NodeId, SliceId, SliceParams, UeId, check_id};

use crate::error::{SliceError, SliceResult};

/// Kind of a slice operation, for logging and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    CreateSlice,
    UpdateSlice,
    DeleteSlice,
    SetUeAssociation,
    ResetUeAssociation,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::CreateSlice => "create_slice",
            OperationKind::UpdateSlice => "update_slice",
            OperationKind::DeleteSlice => "delete_slice",
            OperationKind::SetUeAssociation => "set_ue_association",
            OperationKind::ResetUeAssociation => "reset_ue_association",
        };
        f.write_str(name)
    }
}

/// Payload of a slice operation addressed to one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SliceRequest {
    Create {
        slice_id: SliceId,
        params: SliceParams,
    },
    Update {
        slice_id: SliceId,
        params: SliceParams,
    },
    Delete {
        slice_id: SliceId,
    },
    SetUeAssociation {
        ue_id: UeId,
        slice_id: SliceId,
        drb_id: Option<u32>,
    },
    ResetUeAssociation {
        ue_id: UeId,
    },
}

impl SliceRequest {
    pub fn kind(&self) -> OperationKind {
        match self {
            SliceRequest::Create { .. } => OperationKind::CreateSlice,
            SliceRequest::Update { .. } => OperationKind::UpdateSlice,
            SliceRequest::Delete { .. } => OperationKind::DeleteSlice,
            SliceRequest::SetUeAssociation { .. } => OperationKind::SetUeAssociation,
            SliceRequest::ResetUeAssociation { .. } => OperationKind::ResetUeAssociation,
        }
    }

    /// Structural validation, done before anything is queued.
    pub fn validate(&self) -> SliceResult<()> {
        match self {
            SliceRequest::Create { slice_id, .. }
            | SliceRequest::Update { slice_id, .. }
            | SliceRequest::Delete { slice_id } => validate_id("slice_id", slice_id),
            SliceRequest::SetUeAssociation {
                ue_id, slice_id, ..
            } => {
                validate_id("ue_id", ue_id)?;
                validate_id("slice_id", slice_id)
            }
            SliceRequest::ResetUeAssociation { ue_id } => validate_id("ue_id", ue_id),
        }
    }
}

/// Check an identifier is non-empty, bounded, and usable as a key segment.
pub fn validate_id(field: &str, value: &str) -> SliceResult<()> {
    check_id(value).map_err(|reason| SliceError::Validation(format!("{field} {reason}")))
}

/// A request travelling through a node queue, with the channel its
/// submitter is waiting on.
pub(crate) struct Operation {
    pub node_id: NodeId,
    pub request: SliceRequest,
    pub done: oneshot::Sender<SliceResult<()>>,
}
