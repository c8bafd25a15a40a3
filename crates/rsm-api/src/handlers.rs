//! REST API handlers.
//!
//! Mutations go through the orchestrator and answer with an `Ack`; reads
//! return the `{success, data | error}` envelope.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use rsm_slicing::SliceError;
use rsm_state::{NodeInfo, SliceParams};

use crate::ApiState;
use crate::ack::respond;

/// Response wrapper for reads.
#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
        .into_response()
}

/// Unwrap a JSON body, turning a malformed one into a validation `Ack`.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| respond(Err(SliceError::Validation(rejection.body_text()))))
}

// ── Request bodies ─────────────────────────────────────────────

/// POST /api/v1/nodes/{node}/slices
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSliceRequest {
    pub slice_id: String,
    #[serde(default)]
    pub params: SliceParams,
}

/// PUT /api/v1/nodes/{node}/slices/{slice}
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateSliceRequest {
    #[serde(default)]
    pub params: SliceParams,
}

/// PUT /api/v1/nodes/{node}/ues/{ue}/slice
#[derive(Debug, Serialize, Deserialize)]
pub struct SetUeSliceAssociationRequest {
    pub slice_id: String,
    #[serde(default)]
    pub drb_id: Option<u32>,
}

/// POST /api/v1/nodes
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterNodeRequest {
    pub id: String,
    pub address: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// A node as listed by the API.
#[derive(Debug, Serialize)]
pub struct NodeView {
    #[serde(flatten)]
    pub node: NodeInfo,
    /// Operations waiting in the node's queue.
    pub queued: usize,
}

// ── Slices ─────────────────────────────────────────────────────

pub async fn create_slice(
    State(state): State<ApiState>,
    Path(node): Path<String>,
    payload: Result<Json<CreateSliceRequest>, JsonRejection>,
) -> Response {
    let req = match body(payload) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    debug!(%node, slice_id = %req.slice_id, "CreateSlice");
    respond(
        state
            .orchestrator
            .create_slice(&node, &req.slice_id, req.params)
            .await,
    )
}

pub async fn update_slice(
    State(state): State<ApiState>,
    Path((node, slice)): Path<(String, String)>,
    payload: Result<Json<UpdateSliceRequest>, JsonRejection>,
) -> Response {
    let req = match body(payload) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    debug!(%node, slice_id = %slice, "UpdateSlice");
    respond(state.orchestrator.update_slice(&node, &slice, req.params).await)
}

pub async fn delete_slice(
    State(state): State<ApiState>,
    Path((node, slice)): Path<(String, String)>,
) -> Response {
    debug!(%node, slice_id = %slice, "DeleteSlice");
    respond(state.orchestrator.delete_slice(&node, &slice).await)
}

/// GET /api/v1/nodes/{node}/slices
pub async fn list_slices(State(state): State<ApiState>, Path(node): Path<String>) -> Response {
    match state.orchestrator.slices(&node).await {
        Ok(slices) => ApiResponse::ok(slices).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// GET /api/v1/nodes/{node}/slices/{slice}
pub async fn get_slice(
    State(state): State<ApiState>,
    Path((node, slice)): Path<(String, String)>,
) -> Response {
    match state.orchestrator.slice(&node, &slice).await {
        Ok(Some(slice)) => ApiResponse::ok(slice).into_response(),
        Ok(None) => error_response("slice not found", StatusCode::NOT_FOUND),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR),
    }
}

// ── UE associations ────────────────────────────────────────────

pub async fn set_ue_slice_association(
    State(state): State<ApiState>,
    Path((node, ue)): Path<(String, String)>,
    payload: Result<Json<SetUeSliceAssociationRequest>, JsonRejection>,
) -> Response {
    let req = match body(payload) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    debug!(%node, ue_id = %ue, slice_id = %req.slice_id, "SetUeSliceAssociation");
    respond(
        state
            .orchestrator
            .set_ue_slice_association(&node, &ue, &req.slice_id, req.drb_id)
            .await,
    )
}

pub async fn reset_ue_slice_association(
    State(state): State<ApiState>,
    Path((node, ue)): Path<(String, String)>,
) -> Response {
    debug!(%node, ue_id = %ue, "ResetUeSliceAssociation");
    respond(state.orchestrator.reset_ue_slice_association(&node, &ue).await)
}

/// GET /api/v1/nodes/{node}/ues
pub async fn list_ue_associations(
    State(state): State<ApiState>,
    Path(node): Path<String>,
) -> Response {
    match state.orchestrator.ue_associations(&node).await {
        Ok(assocs) => ApiResponse::ok(assocs).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR),
    }
}

// ── Nodes ──────────────────────────────────────────────────────

/// GET /api/v1/nodes
pub async fn list_nodes(State(state): State<ApiState>) -> Response {
    let nodes = match state.topology.list() {
        Ok(nodes) => nodes,
        Err(e) => return error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR),
    };
    let depths: BTreeMap<String, usize> = state
        .orchestrator
        .queue_stats()
        .await
        .into_iter()
        .map(|s| (s.node_id, s.queued))
        .collect();

    let views: Vec<NodeView> = nodes
        .into_iter()
        .map(|node| NodeView {
            queued: depths.get(&node.id).copied().unwrap_or(0),
            node,
        })
        .collect();
    ApiResponse::ok(views).into_response()
}

/// POST /api/v1/nodes
pub async fn register_node(
    State(state): State<ApiState>,
    Json(req): Json<RegisterNodeRequest>,
) -> Response {
    match state.topology.register(&req.id, &req.address, req.labels) {
        Ok(node) => (StatusCode::CREATED, ApiResponse::ok(node)).into_response(),
        Err(e @ rsm_topo::DirectoryError::InvalidNode(_)) => {
            error_response(&e.to_string(), StatusCode::BAD_REQUEST)
        }
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// DELETE /api/v1/nodes/{node}
pub async fn remove_node(State(state): State<ApiState>, Path(node): Path<String>) -> Response {
    match state.topology.remove(&node) {
        Ok(true) => ApiResponse::ok("removed").into_response(),
        Ok(false) => error_response("node not found", StatusCode::NOT_FOUND),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR),
    }
}
