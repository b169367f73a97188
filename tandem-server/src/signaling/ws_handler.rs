use crate::signaling::SignalingRelay;
use axum::extract::State;
use axum::extract::WebSocketUpgrade;
use axum::extract::ws::{Message, WebSocket};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tandem_core::ClientMessage;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(relay): State<SignalingRelay>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, relay))
}

async fn handle_socket(socket: WebSocket, relay: SignalingRelay) {
    let (participant_id, mut rx) = relay.connect();
    info!("New WebSocket connection: {}", participant_id);

    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize relay message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Credential requests are answered in order, off the receive loop, so
    // signals never wait behind an upstream fetch.
    let (ice_tx, mut ice_rx) = mpsc::unbounded_channel::<()>();
    let ice_task = tokio::spawn({
        let relay = relay.clone();

        async move {
            while ice_rx.recv().await.is_some() {
                relay.issue_ice_servers(participant_id).await;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let relay = relay.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(ClientMessage::Signal(signal)) => {
                            relay.route_signal(participant_id, signal);
                        }
                        Ok(ClientMessage::RequestIceServers) => {
                            let _ = ice_tx.send(());
                        }
                        Err(e) => warn!("Invalid ClientMessage from {}: {}", participant_id, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };
    ice_task.abort();

    relay.disconnect(&participant_id);
    info!("WebSocket disconnected: {}", participant_id);
}
