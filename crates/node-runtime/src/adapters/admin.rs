//! # Admin Endpoint
//!
//! Small HTTP surface for operators and scrapers:
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /health` | liveness JSON |
//! | `GET /status` | outbox count, latest checkpoint, proven index per inbox |
//! | `GET /metrics` | Prometheus text exposition |

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use shared_types::{Checkpoint, Domain};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use xmp_02_outbox::OutboxState;

/// Point-in-time view of the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatus {
    /// Origin domain
    pub origin: Domain,
    /// Outbox lifecycle state
    pub outbox_state: OutboxState,
    /// Messages committed so far
    pub dispatched: u32,
    /// Latest outbox checkpoint
    pub latest_checkpoint: Option<Checkpoint>,
    /// Highest proven checkpoint index per destination inbox
    pub inboxes: BTreeMap<Domain, Option<u32>>,
}

/// Produces a fresh `NodeStatus` per request.
pub type StatusSource = Arc<dyn Fn() -> NodeStatus + Send + Sync>;

/// Build the admin router.
pub fn admin_router(status: StatusSource) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(node_status))
        .route("/metrics", get(metrics))
        .with_state(status)
}

/// Serve `router` on `addr` until `shutdown` flips.
pub async fn serve_admin(
    addr: SocketAddr,
    router: Router,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Admin endpoint listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
        })
        .await
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "xmp-node",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn node_status(State(status): State<StatusSource>) -> Json<NodeStatus> {
    Json(status())
}

async fn metrics() -> Response {
    match xmp_telemetry::encode_metrics() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
