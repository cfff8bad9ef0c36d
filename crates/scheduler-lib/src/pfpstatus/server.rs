//! HTTP endpoints for recorded statuses

use super::params::HttpParams;
use super::store::StatusStore;
use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

#[derive(Debug, Serialize)]
struct CountResponse {
    nodes: usize,
}

fn json_response<T: Serialize>(content: &T, endpoint: &str) -> Response {
    match serde_json::to_vec(content) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => {
            warn!(endpoint = %endpoint, error = %e, "Failed to encode status content");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn count_nodes<S: StatusStore>(State(store): State<Arc<S>>) -> Response {
    let resp = CountResponse {
        nodes: store.count_nodes(),
    };
    json_response(&resp, "generic")
}

async fn all_content<S: StatusStore>(State(store): State<Arc<S>>) -> Response {
    json_response(&store.content(), "all")
}

async fn node_content<S: StatusStore>(
    State(store): State<Arc<S>>,
    Path(node_name): Path<String>,
) -> Response {
    if node_name.is_empty() {
        return missing_node_name().await;
    }

    match store.content_for_node(&node_name) {
        Some(content) => json_response(&content, &node_name),
        None => (StatusCode::UNPROCESSABLE_ENTITY, "unknown node name").into_response(),
    }
}

async fn missing_node_name() -> Response {
    info!("Requested pfpstatus for empty node");
    (StatusCode::UNPROCESSABLE_ENTITY, "missing node name").into_response()
}

/// Router serving `store` under `/pfpstatus`
///
/// `/pfpstatus/_all` returns every node keyed by name; `_` never occurs
/// in a node name, so the route cannot shadow a real node.
pub fn create_router<S: StatusStore>(store: Arc<S>) -> Router {
    Router::new()
        .route("/pfpstatus", get(count_nodes::<S>))
        .route("/pfpstatus/", get(missing_node_name))
        .route("/pfpstatus/_all", get(all_content::<S>))
        .route("/pfpstatus/:node_name", get(node_content::<S>))
        .with_state(store)
}

/// Address to bind for the given host and port; an empty host means all interfaces
///
/// IP literals are formatted as socket addresses so IPv6 hosts get brackets.
pub fn bind_address(host: &str, port: u16) -> String {
    let host = if host.is_empty() { "0.0.0.0" } else { host };
    match host.parse::<IpAddr>() {
        Ok(ip) => SocketAddr::new(ip, port).to_string(),
        Err(_) => format!("{}:{}", host, port),
    }
}

/// Serve `store` until shutdown
pub async fn serve<S: StatusStore>(
    store: Arc<S>,
    params: &HttpParams,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let app = create_router(store);

    let addr = bind_address(&params.host, params.port);
    info!(addr = %addr, "Starting PFP status server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind PFP status server to {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
        .context("PFP status server failed")?;

    info!("PFP status server stopped");
    Ok(())
}
