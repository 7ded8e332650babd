//! WebSocket handler for real-time updates
//!
//! Pushes two event kinds to connected clients:
//! - `summary_update` after each summation aggregator run
//! - `pools_update` after each throttled pool broadcast

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::db::PoolVolume;

/// WebSocket state for managing connections
pub struct WsState {
    /// Broadcast channel for sending updates to all clients
    pub tx: broadcast::Sender<WsEvent>,
}

impl WsState {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(100);
        Self { tx }
    }

    /// Broadcast an event to all connected clients
    pub fn broadcast(&self, event: WsEvent) {
        // Ignore send errors (no receivers)
        let _ = self.tx.send(event);
    }
}

impl Default for WsState {
    fn default() -> Self {
        Self::new()
    }
}

/// Events that can be sent over WebSocket
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum WsEvent {
    /// New summation data is available
    #[serde(rename = "summary_update")]
    SummaryUpdate(SummaryUpdateData),

    /// Pool aggregates were recomputed
    #[serde(rename = "pools_update")]
    PoolsUpdate(PoolsUpdateData),
}

#[derive(Clone, Debug, Serialize)]
pub struct SummaryUpdateData {
    pub timestamp: DateTime<Utc>,
    pub end_block: i64,
    pub transaction_count: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct PoolsUpdateData {
    pub block_number: i64,
    pub pools: Vec<PoolVolume>,
}

/// WebSocket upgrade handler
///
/// GET /ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<WsState>>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<WsState>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe to broadcast channel
    let mut rx = state.tx.subscribe();

    // Task to send events to client
    let send_task = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            let msg = match serde_json::to_string(&event) {
                Ok(json) => Message::Text(json.into()),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize WebSocket event");
                    continue;
                }
            };

            if sender.send(msg).await.is_err() {
                // Client disconnected
                break;
            }
        }
    });

    // Task to receive messages from client (mainly for ping/pong)
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Ping(data) => {
                    tracing::debug!("Received ping");
                    // Pong is automatically sent by axum
                    let _ = data;
                }
                Message::Close(_) => {
                    tracing::debug!("Client requested close");
                    break;
                }
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = send_task => {
            tracing::debug!("Send task finished");
        }
        _ = recv_task => {
            tracing::debug!("Receive task finished");
        }
    }

    tracing::debug!("WebSocket connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_event_serialization() {
        let event = WsEvent::SummaryUpdate(SummaryUpdateData {
            timestamp: Utc::now(),
            end_block: 1234,
            transaction_count: 17,
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("summary_update"));
        assert!(json.contains("1234"));
    }

    #[test]
    fn test_pools_event_serialization() {
        let event = WsEvent::PoolsUpdate(PoolsUpdateData {
            block_number: 99,
            pools: vec![PoolVolume {
                pool_address: Some("TPool".to_string()),
                delegation_count: 2,
                total_amount_sun: 5_000_000,
                total_normalized_trx: 5.0,
            }],
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("pools_update"));
        assert!(json.contains("TPool"));
    }
}
