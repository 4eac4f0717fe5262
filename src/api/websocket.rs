// SPDX-License-Identifier: GPL-3.0-only
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::routing::get;
use axum::Json;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::api::handlers::ApiHandlers;
use crate::store::SetName;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum WsMessage {
    Toggle { set: SetName, id: String },
    Check { set: SetName, id: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct WsResponse {
    success: bool,
    data: Option<serde_json::Value>,
    error: Option<String>,
}

impl WsResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

pub struct WebSocketServer {
    handlers: Arc<ApiHandlers>,
}

impl WebSocketServer {
    pub fn new(handlers: Arc<ApiHandlers>) -> Self {
        Self { handlers }
    }

    pub fn router(&self) -> Router {
        let handlers = self.handlers.clone();
        Router::new().route(
            "/ws",
            get(move |ws: WebSocketUpgrade| async move {
                ws.on_upgrade(move |socket| handle_socket(socket, handlers))
            }),
        )
    }
}

async fn handle_socket(socket: WebSocket, handlers: Arc<ApiHandlers>) {
    let (sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    // Every sync event is pushed to the client as it happens
    let bus = handlers.coordinator().bus().clone();
    let (subscription, mut events) = bus.channel(|_| true);
    info!("WebSocket client connected");

    let mut send_task = tokio::spawn(async move {
        let mut sender = sender;
        loop {
            let msg = tokio::select! {
                Some(msg) = rx.recv() => msg,
                Some(event) = events.recv() => match serde_json::to_string(&event) {
                    Ok(text) => Message::Text(text),
                    Err(e) => {
                        error!(error = %e, "Failed to encode sync event");
                        continue;
                    }
                },
                else => break,
            };
            if let Err(e) = sender.send(msg).await {
                error!(error = %e, "Failed to send WebSocket message");
                break;
            }
        }
    });

    let handlers_clone = handlers.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    let response = respond(&text, &handlers_clone).await;
                    match serde_json::to_string(&response) {
                        Ok(text) => {
                            if tx.send(Message::Text(text)).is_err() {
                                break;
                            }
                        }
                        Err(e) => error!(error = %e, "Failed to encode WebSocket response"),
                    }
                }
                Message::Close(_) => {
                    info!("WebSocket connection closed");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    bus.unsubscribe(subscription);
    debug!("WebSocket event subscription released");
}

async fn respond(text: &str, handlers: &ApiHandlers) -> WsResponse {
    let msg: WsMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => return WsResponse::failure(format!("Invalid message format: {}", e)),
    };

    let (result, failure) = match msg {
        WsMessage::Toggle { set, id } => (handlers.toggle_membership(set, id).await, "Failed to toggle membership"),
        WsMessage::Check { set, id } => (handlers.check_membership(set, id).await, "Failed to check membership"),
    };

    match result {
        Ok(Json(api_response)) => WsResponse {
            success: api_response.success,
            data: api_response
                .data
                .and_then(|status| serde_json::to_value(status).ok()),
            error: api_response.error,
        },
        Err(_) => WsResponse::failure(failure),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MembershipCache;
    use crate::coordinator::{RetryQueue, ToggleCoordinator};
    use crate::error::SyncError;
    use crate::events::SyncEventBus;
    use crate::test_helpers::{ScriptedCatalog, ScriptedStore};

    fn handlers(store: Arc<ScriptedStore>) -> ApiHandlers {
        let coordinator = ToggleCoordinator::new(
            store,
            Arc::new(MembershipCache::new()),
            Arc::new(SyncEventBus::new()),
        );
        ApiHandlers::new(coordinator, Arc::new(ScriptedCatalog::new()), Arc::new(RetryQueue::new()))
    }

    #[tokio::test]
    async fn test_toggle_message() {
        let store = Arc::new(ScriptedStore::new().with_likes(&["a"]));
        let handlers = handlers(store.clone());

        let response = respond(r#"{"type": "Toggle", "set": "likes", "id": "a"}"#, &handlers).await;

        assert!(response.success);
        let data = response.data.unwrap();
        assert_eq!(data["is_member"], false);
        assert_eq!(data["source"], "toggled");
        assert!(store.members(SetName::Likes).is_empty());
    }

    #[tokio::test]
    async fn test_check_message() {
        let store = Arc::new(ScriptedStore::new().with_cart(&["n1"]));
        let handlers = handlers(store);

        let response = respond(r#"{"type": "Check", "set": "cart", "id": "n1"}"#, &handlers).await;

        assert!(response.success);
        assert_eq!(response.data.unwrap()["is_member"], true);
    }

    #[tokio::test]
    async fn test_invalid_message() {
        let handlers = handlers(Arc::new(ScriptedStore::new()));

        let response = respond(r#"{"type": "Delete", "id": "n1"}"#, &handlers).await;

        assert!(!response.success);
        assert!(response.error.unwrap().starts_with("Invalid message format"));
    }

    #[tokio::test]
    async fn test_failed_toggle_message() {
        let store = Arc::new(ScriptedStore::new().with_likes(&[]));
        store.fail_next_fetch(SyncError::Network("offline".to_string()));
        let handlers = handlers(store);

        let response = respond(r#"{"type": "Toggle", "set": "likes", "id": "a"}"#, &handlers).await;

        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("Failed to toggle membership"));
    }
}
