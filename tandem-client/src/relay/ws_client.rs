use crate::error::RelayError;
use crate::relay::{CredentialSource, RelayEvent, SignalingOutput};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tandem_core::utils::default_stun_servers;
use tandem_core::{ClientMessage, IceServerConfig, ParticipantId, ServerMessage, Signal};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

type PendingCredentials = Arc<Mutex<VecDeque<oneshot::Sender<Vec<IceServerConfig>>>>>;

/// Agent side of the relay WebSocket.
///
/// Relay frames other than `ice_servers` are surfaced as [`RelayEvent`]s.
/// Credential responses are matched to requests in FIFO order.
pub struct WsRelayClient {
    local_id: ParticipantId,
    outbound: mpsc::UnboundedSender<ClientMessage>,
    pending: PendingCredentials,
    credential_timeout: Duration,
    send_task: JoinHandle<()>,
    recv_task: JoinHandle<()>,
}

impl WsRelayClient {
    /// Connects to `url` (e.g. `ws://host:3000/ws`) and waits for the welcome.
    pub async fn connect(
        url: &str,
        credential_timeout: Duration,
    ) -> Result<(Self, mpsc::Receiver<RelayEvent>), RelayError> {
        let (socket, _) = connect_async(url).await?;
        let (mut sender, mut receiver) = socket.split();

        let local_id = loop {
            match receiver.next().await {
                Some(Ok(Message::Text(text))) => match serde_json::from_str(&text) {
                    Ok(ServerMessage::Welcome { participant_id }) => break participant_id,
                    Ok(other) => {
                        return Err(RelayError::Handshake(format!(
                            "expected welcome, got {:?}",
                            other
                        )));
                    }
                    Err(e) => return Err(RelayError::Handshake(e.to_string())),
                },
                Some(Ok(Message::Close(_))) | None => return Err(RelayError::Closed),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(RelayError::Connect(e)),
            }
        };
        info!("Connected to relay {} as {}", url, local_id);

        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<ClientMessage>();
        let (event_tx, event_rx) = mpsc::channel(256);
        let pending: PendingCredentials = Arc::new(Mutex::new(VecDeque::new()));

        let send_task = tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Failed to encode relay message: {}", e);
                        continue;
                    }
                };
                if sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            let _ = sender.close().await;
        });

        let recv_pending = Arc::clone(&pending);
        let recv_task = tokio::spawn(async move {
            while let Some(Ok(msg)) = receiver.next().await {
                let text = match msg {
                    Message::Text(text) => text,
                    Message::Close(_) => break,
                    _ => continue,
                };

                let server_msg: ServerMessage = match serde_json::from_str(&text) {
                    Ok(m) => m,
                    Err(e) => {
                        warn!("Invalid relay frame: {}", e);
                        continue;
                    }
                };

                let event = match server_msg {
                    ServerMessage::Join { participant_id } => RelayEvent::Join(participant_id),
                    ServerMessage::Leave { participant_id } => RelayEvent::Leave(participant_id),
                    ServerMessage::Signal(signal) => RelayEvent::Signal(signal),
                    ServerMessage::IceServers { ice_servers } => {
                        match recv_pending.lock().await.pop_front() {
                            Some(waiter) => {
                                let _ = waiter.send(ice_servers);
                            }
                            None => warn!("Unrequested ice server list from relay"),
                        }
                        continue;
                    }
                    ServerMessage::Welcome { participant_id } => {
                        warn!("Repeated welcome from relay ({})", participant_id);
                        continue;
                    }
                };

                if event_tx.send(event).await.is_err() {
                    break;
                }
            }
            info!("Relay connection closed");
        });

        let client = Self {
            local_id,
            outbound,
            pending,
            credential_timeout,
            send_task,
            recv_task,
        };
        Ok((client, event_rx))
    }

    pub fn local_id(&self) -> ParticipantId {
        self.local_id
    }

    /// Drops the socket. The relay announces our leave to everyone else.
    pub fn close(&self) {
        self.send_task.abort();
        self.recv_task.abort();
    }

    fn send(&self, msg: ClientMessage) -> Result<(), RelayError> {
        self.outbound.send(msg).map_err(|_| RelayError::Closed)
    }
}

impl Drop for WsRelayClient {
    fn drop(&mut self) {
        self.close();
    }
}

#[async_trait]
impl SignalingOutput for WsRelayClient {
    async fn send_signal(&self, signal: Signal) -> Result<(), RelayError> {
        debug!("-> {} to {}", signal.kind, signal.to);
        self.send(ClientMessage::Signal(signal))
    }
}

#[async_trait]
impl CredentialSource for WsRelayClient {
    async fn ice_servers(&self) -> Vec<IceServerConfig> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.push_back(tx);

        if self.send(ClientMessage::RequestIceServers).is_err() {
            warn!("Relay closed, using default STUN servers");
            return default_stun_servers();
        }

        match tokio::time::timeout(self.credential_timeout, rx).await {
            Ok(Ok(servers)) => servers,
            _ => {
                warn!(
                    "No ice server list from relay within {:?}, using default STUN servers",
                    self.credential_timeout
                );
                default_stun_servers()
            }
        }
    }
}
