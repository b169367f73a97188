
pub use mock_upstream::*;
pub use test_participant::*;

use std::net::SocketAddr;
use tandem_server::{CredentialBroker, SignalingRelay, router};
use tokio::net::TcpListener;

/// Timeout for a single relay frame (ms).
pub const FRAME_TIMEOUT_MS: u64 = 2000;

/// Starts a relay on an ephemeral local port and returns its address.
pub async fn spawn_relay(broker: CredentialBroker) -> SocketAddr {
    let relay = SignalingRelay::new(broker);
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind relay listener");
    let addr = listener.local_addr().expect("Relay listener has no address");

    tokio::spawn(async move {
        let _ = axum::serve(listener, router(relay)).await;
    });

    addr
}
