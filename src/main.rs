// SPDX-License-Identifier: GPL-3.0-only
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use fakenft_sync::api::{ApiHandlers, HttpServer};
use fakenft_sync::cache::MembershipCache;
use fakenft_sync::catalog::{CatalogService, HttpCatalog};
use fakenft_sync::config::Config;
use fakenft_sync::coordinator::{RetryQueue, ToggleCoordinator};
use fakenft_sync::events::{SyncEvent, SyncEventBus};
use fakenft_sync::logging::setup_logging;
use fakenft_sync::network::ApiClient;
use fakenft_sync::store::{HttpSetStore, RemoteSetStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    setup_logging(&config.log_level, config.log_json)?;

    info!("Starting fakenft-sync v{}", env!("CARGO_PKG_VERSION"));

    let client = ApiClient::from_config(&config)?;
    if config.api_token.is_none() {
        warn!("No API token configured; backend requests will be unauthenticated");
    }
    info!(base_url = %client.base_url(), "Backend client initialized");

    let store: Arc<dyn RemoteSetStore> = Arc::new(HttpSetStore::from_config(client.clone(), &config));
    let catalog: Arc<dyn CatalogService> = Arc::new(HttpCatalog::new(client));

    // Owned state shared by every consumer; no globals
    let cache = Arc::new(MembershipCache::new());
    let bus = Arc::new(SyncEventBus::new());
    let retries = Arc::new(RetryQueue::new());
    let coordinator = ToggleCoordinator::new(store, cache, Arc::clone(&bus))
        .with_retry_hook(retries.clone());

    bus.subscribe_all(|event| match event {
        SyncEvent::MembershipChanged(change) => info!(
            set = %change.set,
            item_id = %change.item_id,
            is_member = change.is_member,
            "Membership changed"
        ),
        SyncEvent::ProfileUpdated(profile) => info!(profile_id = %profile.id, "Profile updated"),
    });

    // Start HTTP server (the WebSocket event stream is served on the same port)
    let handlers = Arc::new(ApiHandlers::new(coordinator, catalog, retries));
    let http_server = HttpServer::new(handlers, config.local_api_bind);
    let http_task = tokio::spawn(async move {
        if let Err(e) = http_server.serve().await {
            error!(error = %e, "HTTP server error");
        }
    });

    info!("All services started. Waiting for shutdown signal...");

    // Wait for shutdown signal
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal (Ctrl+C)");
        }
        Err(err) => {
            error!(error = %err, "Unable to listen for shutdown signal");
        }
    }

    info!("Initiating graceful shutdown...");
    http_task.abort();

    info!("Shutdown complete");
    Ok(())
}
