//! rsm-api — northbound REST gateway for the RAN slice manager.
//!
//! Thin axum layer: each handler unmarshals a request into an orchestrator
//! call and marshals the outcome into an `Ack`. No slice logic lives here.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/v1/nodes` | List nodes with queue depth |
//! | POST | `/api/v1/nodes` | Register a node |
//! | DELETE | `/api/v1/nodes/{node}` | Remove a node |
//! | GET | `/api/v1/nodes/{node}/slices` | List slices |
//! | POST | `/api/v1/nodes/{node}/slices` | CreateSlice |
//! | GET | `/api/v1/nodes/{node}/slices/{slice}` | Get a slice |
//! | PUT | `/api/v1/nodes/{node}/slices/{slice}` | UpdateSlice |
//! | DELETE | `/api/v1/nodes/{node}/slices/{slice}` | DeleteSlice |
//! | GET | `/api/v1/nodes/{node}/ues` | List UE associations |
//! | PUT | `/api/v1/nodes/{node}/ues/{ue}/slice` | SetUeSliceAssociation |
//! | DELETE | `/api/v1/nodes/{node}/ues/{ue}/slice` | ResetUeSliceAssociation |

pub mod ack;
pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, put};
use rsm_slicing::Orchestrator;
use rsm_topo::TopoRegistry;

pub use ack::Ack;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
    pub topology: Arc<TopoRegistry>,
}

/// Build the complete API router.
pub fn build_router(orchestrator: Arc<Orchestrator>, topology: Arc<TopoRegistry>) -> Router {
    let state = ApiState {
        orchestrator,
        topology,
    };

    let api_routes = Router::new()
        .route("/nodes", get(handlers::list_nodes).post(handlers::register_node))
        .route("/nodes/{node}", axum::routing::delete(handlers::remove_node))
        .route(
            "/nodes/{node}/slices",
            get(handlers::list_slices).post(handlers::create_slice),
        )
        .route(
            "/nodes/{node}/slices/{slice}",
            get(handlers::get_slice)
                .put(handlers::update_slice)
                .delete(handlers::delete_slice),
        )
        .route("/nodes/{node}/ues", get(handlers::list_ue_associations))
        .route(
            "/nodes/{node}/ues/{ue}/slice",
            put(handlers::set_ue_slice_association).delete(handlers::reset_ue_slice_association),
        )
        .with_state(state);

    Router::new().nest("/api/v1", api_routes)
}
