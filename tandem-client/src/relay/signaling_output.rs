use crate::error::RelayError;
use async_trait::async_trait;
use tandem_core::{IceServerConfig, Signal};

/// Outbound half of the relay channel, as seen by an engine.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Sends `signal` to `signal.to`. Delivery is best effort.
    async fn send_signal(&self, signal: Signal) -> Result<(), RelayError>;
}

/// Supplies the ICE servers for a new peer connection.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Never fails; falls back to public STUN.
    async fn ice_servers(&self) -> Vec<IceServerConfig>;
}
