mod config;
mod credentials;
mod signaling;

pub use config::*;
pub use credentials::*;
pub use signaling::*;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Relay routes: `GET /ws` upgrades to the signaling socket.
pub fn router(relay: SignalingRelay) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/healthz", get(healthz))
        .layer(cors)
        .with_state(relay)
}

async fn healthz() -> &'static str {
    "ok"
}

pub async fn serve(config: RelayConfig) -> anyhow::Result<()> {
    let broker = CredentialBroker::from_config(&config);
    let relay = SignalingRelay::new(broker);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!("Signaling relay listening on ws://{}/ws", listener.local_addr()?);

    axum::serve(listener, router(relay)).await?;
    Ok(())
}
