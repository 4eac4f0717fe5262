// SPDX-License-Identifier: GPL-3.0-only
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::api::handlers::{ApiHandlers, ApiResponse, MembershipStatus, PendingRetryInfo, RetryResult};
use crate::api::websocket::WebSocketServer;
use crate::catalog::models::{Collection, Nft};
use crate::profile::Profile;
use crate::store::SetName;

pub struct HttpServer {
    handlers: Arc<ApiHandlers>,
    addr: SocketAddr,
}

impl HttpServer {
    pub fn new(handlers: Arc<ApiHandlers>, addr: SocketAddr) -> Self {
        Self { handlers, addr }
    }

    /// REST routes plus the `/ws` event stream
    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/health", get(ApiHandlers::health))
            .route("/api/profile", get(profile_handler))
            .route("/api/collections", get(collections_handler))
            .route("/api/nft/:id", get(nft_handler))
            .route("/api/membership/:set/:id", get(check_membership_handler))
            .route("/api/membership/:set/:id/toggle", post(toggle_membership_handler))
            .route("/api/retries", get(pending_retries_handler))
            .route("/api/retries/run", post(run_retries_handler))
            .with_state(self.handlers.clone())
            .merge(WebSocketServer::new(self.handlers.clone()).router())
    }

    pub async fn serve(self) -> anyhow::Result<()> {
        let app = self.router();

        info!(addr = %self.addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn profile_handler(
    State(handlers): State<Arc<ApiHandlers>>,
) -> Result<Json<ApiResponse<Profile>>, StatusCode> {
    handlers.profile().await
}

async fn collections_handler(
    State(handlers): State<Arc<ApiHandlers>>,
) -> Result<Json<ApiResponse<Vec<Collection>>>, StatusCode> {
    handlers.collections().await
}

async fn nft_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Nft>>, StatusCode> {
    handlers.nft(&id).await
}

async fn check_membership_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    Path((set, id)): Path<(SetName, String)>,
) -> Result<Json<ApiResponse<MembershipStatus>>, StatusCode> {
    handlers.check_membership(set, id).await
}

async fn toggle_membership_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    Path((set, id)): Path<(SetName, String)>,
) -> Result<Json<ApiResponse<MembershipStatus>>, StatusCode> {
    handlers.toggle_membership(set, id).await
}

async fn pending_retries_handler(
    State(handlers): State<Arc<ApiHandlers>>,
) -> Json<ApiResponse<Vec<PendingRetryInfo>>> {
    handlers.pending_retries().await
}

async fn run_retries_handler(
    State(handlers): State<Arc<ApiHandlers>>,
) -> Json<ApiResponse<Vec<RetryResult>>> {
    handlers.run_retries().await
}
