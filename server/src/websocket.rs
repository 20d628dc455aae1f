use axum::extract::ws::{Message, WebSocket};
use futures::{sink::SinkExt, stream::StreamExt};

use crate::models::ServerEvent;
use crate::state::AppState;

/// Push newly accepted messages to one connected client until either side closes
pub async fn handle_websocket(socket: WebSocket, state: AppState) {
    let connection_id = uuid::Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before anything else so the client sees every message
    // accepted from this point on.
    let mut subscription = state.ingestion.gateway().subscribe();

    state.metrics.increment_connections();
    tracing::info!(
        %connection_id,
        subscribers = state.ingestion.gateway().subscriber_count(),
        "websocket client connected"
    );

    let mut send_task = tokio::spawn(async move {
        while let Some(message) = subscription.recv().await {
            let event = ServerEvent::NewMessage { message: &message };
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!(error = %e, "failed to serialize broadcast event");
                    continue;
                }
            };

            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    // Clients have nothing to say; drain until they close.
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        },
        _ = &mut recv_task => {
            send_task.abort();
        },
    }

    state.metrics.decrement_connections();
    tracing::info!(%connection_id, "websocket client disconnected");
}
