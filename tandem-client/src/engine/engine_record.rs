use crate::engine::NegotiationState;
use crate::media::MediaTrackSet;
use crate::transport::PeerConnection;
use std::sync::Arc;
use tandem_core::{IceCandidate, IceServerConfig, MediaConstraints, ParticipantId};
use tracing::warn;

/// Everything the local side knows about its session with one remote participant.
pub struct EngineRecord {
    remote: ParticipantId,
    pub(crate) peer_connection: Option<Arc<dyn PeerConnection>>,
    /// Fetched once, before the first peer connection is built.
    pub(crate) ice_servers: Option<Vec<IceServerConfig>>,
    /// Candidates received before any remote description was accepted.
    pub(crate) pending_candidates: Vec<IceCandidate>,
    pub(crate) remote_description_accepted: bool,
    pub(crate) ice_connected: bool,
    pub(crate) offer_outstanding: bool,
    /// Last media intent received while an offer was outstanding.
    pub(crate) queued_intent: Option<MediaConstraints>,
    pub(crate) media: Option<MediaTrackSet>,
}

/// Point-in-time copy of an [`EngineRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSnapshot {
    pub remote: ParticipantId,
    pub state: NegotiationState,
    pub has_peer_connection: bool,
    pub ice_servers: Option<Vec<IceServerConfig>>,
    pub pending_candidates: Vec<IceCandidate>,
    pub remote_description_accepted: bool,
    pub ice_connected: bool,
    pub offer_outstanding: bool,
    pub queued_intent: Option<MediaConstraints>,
    pub media: MediaConstraints,
}

impl EngineRecord {
    pub fn new(remote: ParticipantId) -> Self {
        Self {
            remote,
            peer_connection: None,
            ice_servers: None,
            pending_candidates: Vec::new(),
            remote_description_accepted: false,
            ice_connected: false,
            offer_outstanding: false,
            queued_intent: None,
            media: None,
        }
    }

    pub fn remote(&self) -> ParticipantId {
        self.remote
    }

    pub fn state(&self) -> NegotiationState {
        if self.ice_connected {
            NegotiationState::Connected
        } else if self.offer_outstanding {
            NegotiationState::Negotiating
        } else if self.remote_description_accepted {
            NegotiationState::Converging
        } else {
            NegotiationState::Idle
        }
    }

    /// Kinds currently attached to the peer connection.
    pub fn media_constraints(&self) -> MediaConstraints {
        self.media
            .as_ref()
            .map(MediaTrackSet::constraints)
            .unwrap_or(MediaConstraints::NONE)
    }

    /// What the record will be sending once queued work has run.
    pub fn media_target(&self) -> MediaConstraints {
        self.queued_intent
            .unwrap_or_else(|| self.media_constraints())
    }

    pub fn snapshot(&self) -> RecordSnapshot {
        RecordSnapshot {
            remote: self.remote,
            state: self.state(),
            has_peer_connection: self.peer_connection.is_some(),
            ice_servers: self.ice_servers.clone(),
            pending_candidates: self.pending_candidates.clone(),
            remote_description_accepted: self.remote_description_accepted,
            ice_connected: self.ice_connected,
            offer_outstanding: self.offer_outstanding,
            queued_intent: self.queued_intent,
            media: self.media_constraints(),
        }
    }

    /// Stops local media and closes the peer connection. Safe to call twice.
    pub(crate) async fn teardown(&mut self) {
        let peer_connection = self.peer_connection.take();

        if let Some(media) = self.media.take() {
            if let Some(pc) = &peer_connection
                && let Err(e) = pc.detach_media().await
            {
                warn!("Failed to detach media for {}: {:#}", self.remote, e);
            }
            media.stop();
        }

        if let Some(pc) = peer_connection
            && let Err(e) = pc.close().await
        {
            warn!("Failed to close peer connection to {}: {:#}", self.remote, e);
        }

        self.pending_candidates.clear();
        self.queued_intent = None;
        self.remote_description_accepted = false;
        self.ice_connected = false;
        self.offer_outstanding = false;
    }
}
