//! HTTP JSON-RPC server
//!
//! A single `POST /rpc` endpoint dispatches every logical operation; tenant
//! identity is read from the `x-tenant-id` header supplied by the transport
//! in front of this service. Request timeouts live in the HTTP layer
//! (TimeoutLayer), not in the engine.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::engine::MemoryEngine;
use crate::error::{RecallError, Result};
use crate::rpc::{RpcRequest, RpcResponse, codes, handlers};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MemoryEngine>,
}

/// The JSON-RPC server
pub struct RpcServer {
    config: ServerConfig,
    engine: Arc<MemoryEngine>,
}

impl RpcServer {
    pub fn new(config: ServerConfig, engine: Arc<MemoryEngine>) -> Self {
        Self { config, engine }
    }

    /// Start the server and listen for requests
    pub async fn serve(&self) -> Result<()> {
        let state = Arc::new(AppState {
            engine: self.engine.clone(),
        });

        let app = create_router(state).layer((
            TraceLayer::new_for_http(),
            TimeoutLayer::new(Duration::from_secs(self.config.timeout_secs)),
        ));

        let addr: SocketAddr = self
            .config
            .listen_addr
            .parse()
            .map_err(|e| RecallError::Config(format!("Invalid listen address: {e}")))?;

        tracing::info!("Starting RPC server on {addr}");

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| RecallError::Server(format!("Failed to bind to {addr}: {e}")))?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| RecallError::Server(format!("Server error: {e}")))?;

        tracing::info!("RPC server shut down gracefully");
        Ok(())
    }
}

/// Create the router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/rpc", post(rpc_handler))
        .with_state(state)
}

/// Health check endpoint - returns JSON status
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Single JSON-RPC dispatch endpoint
async fn rpc_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<RpcResponse> {
    let request: RpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            return Json(RpcResponse::error(
                None,
                codes::PARSE_ERROR,
                format!("Parse error: {e}"),
            ));
        }
    };

    let Some(tenant) = headers
        .get("x-tenant-id")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
    else {
        return Json(RpcResponse::error(
            request.id,
            codes::INVALID_PARAMS,
            "missing x-tenant-id header".to_string(),
        ));
    };

    if !handlers::is_known_method(&request.method) {
        return Json(RpcResponse::error(
            request.id,
            codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", request.method),
        ));
    }

    tracing::debug!(method = %request.method, tenant, "rpc call");

    match handlers::dispatch(&state.engine, tenant, &request.method, request.params).await {
        Ok(result) => Json(RpcResponse::success(request.id, result)),
        Err(e) => Json(RpcResponse::from_error(request.id, e)),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
