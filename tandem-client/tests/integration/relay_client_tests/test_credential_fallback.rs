use futures::{SinkExt, StreamExt};
use std::time::{Duration, Instant};
use tandem_client::{CredentialSource, WsRelayClient};
use tandem_core::utils::default_stun_servers;
use tandem_core::{ParticipantId, ServerMessage};
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use crate::integration::init_tracing;

/// Welcomes one client, then never answers anything.
async fn spawn_silent_relay() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind silent relay");
    let addr = listener.local_addr().expect("Silent relay has no address");

    tokio::spawn(async move {
        let Ok((stream, _)) = listener.accept().await else {
            return;
        };
        let Ok(mut socket) = accept_async(stream).await else {
            return;
        };
        let welcome = ServerMessage::Welcome {
            participant_id: ParticipantId::new(),
        };
        let json = serde_json::to_string(&welcome).expect("welcome");
        let _ = socket.send(Message::Text(json.into())).await;
        while socket.next().await.is_some() {}
    });

    format!("ws://{}", addr)
}

#[tokio::test]
async fn test_credential_fallback() {
    init_tracing();

    let url = spawn_silent_relay().await;
    let (client, _events) = WsRelayClient::connect(&url, Duration::from_millis(150))
        .await
        .expect("Failed to connect");

    let started = Instant::now();
    let servers = client.ice_servers().await;

    assert_eq!(servers, default_stun_servers());
    assert!(started.elapsed() >= Duration::from_millis(150));
}
