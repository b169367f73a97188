use crate::credentials::CredentialBroker;
use dashmap::DashMap;
use std::sync::Arc;
use tandem_core::{ParticipantId, ServerMessage, Signal};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

struct RelayInner {
    participants: DashMap<ParticipantId, mpsc::UnboundedSender<ServerMessage>>,
    broker: CredentialBroker,
}

/// Routes negotiation messages between connected participants.
///
/// The relay never looks inside a signal payload. It only stamps the sender
/// and forwards to whoever is named in `to`, if that participant is still
/// connected.
#[derive(Clone)]
pub struct SignalingRelay {
    inner: Arc<RelayInner>,
}

impl SignalingRelay {
    pub fn new(broker: CredentialBroker) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                participants: DashMap::new(),
                broker,
            }),
        }
    }

    /// Registers a new connection under a fresh identity.
    ///
    /// The new participant receives `welcome`, everyone else receives `join`.
    pub fn connect(&self) -> (ParticipantId, mpsc::UnboundedReceiver<ServerMessage>) {
        let participant_id = ParticipantId::new();
        let (tx, rx) = mpsc::unbounded_channel();

        let _ = tx.send(ServerMessage::Welcome { participant_id });
        self.inner.participants.insert(participant_id, tx);

        info!("Participant {} connected", participant_id);
        self.broadcast_except(&participant_id, ServerMessage::Join { participant_id });

        (participant_id, rx)
    }

    pub fn disconnect(&self, participant_id: &ParticipantId) {
        if self.inner.participants.remove(participant_id).is_none() {
            return;
        }

        info!("Participant {} disconnected", participant_id);
        self.broadcast_except(
            participant_id,
            ServerMessage::Leave {
                participant_id: *participant_id,
            },
        );
    }

    pub fn is_connected(&self, participant_id: &ParticipantId) -> bool {
        self.inner.participants.contains_key(participant_id)
    }

    pub fn participant_count(&self) -> usize {
        self.inner.participants.len()
    }

    /// Answers a credential request with the broker's list for `participant`.
    ///
    /// May wait on the upstream credential service; callers run it off the
    /// participant's receive loop.
    pub async fn issue_ice_servers(&self, participant: ParticipantId) {
        let ice_servers = self.inner.broker.ice_servers(&participant).await;
        debug!(
            "Issuing {} ICE server entries to {}",
            ice_servers.len(),
            participant
        );
        self.deliver(&participant, ServerMessage::IceServers { ice_servers });
    }

    /// Stamps `from` with the sending connection and forwards the signal.
    ///
    /// Returns whether the recipient was connected at the time of sending.
    pub fn route_signal(&self, sender: ParticipantId, signal: Signal) -> bool {
        if let Some(claimed) = signal.from {
            if claimed != sender {
                warn!(
                    "Participant {} claimed to be {}, overriding sender",
                    sender, claimed
                );
            }
        }

        let to = signal.to;
        let kind = signal.kind.clone();
        let delivered = self.deliver(&to, ServerMessage::Signal(signal.stamped(sender)));

        if delivered {
            debug!("Forwarded '{}' signal {} -> {}", kind, sender, to);
        } else {
            warn!(
                "Dropped '{}' signal from {}: recipient {} is not connected",
                kind, sender, to
            );
        }
        delivered
    }

    fn deliver(&self, to: &ParticipantId, msg: ServerMessage) -> bool {
        let Some(peer) = self.inner.participants.get(to) else {
            return false;
        };
        peer.send(msg).is_ok()
    }

    fn broadcast_except(&self, except: &ParticipantId, msg: ServerMessage) {
        let recipients: Vec<_> = self
            .inner
            .participants
            .iter()
            .filter(|entry| entry.key() != except)
            .map(|entry| entry.value().clone())
            .collect();

        for recipient in recipients {
            let _ = recipient.send(msg.clone());
        }
    }
}
