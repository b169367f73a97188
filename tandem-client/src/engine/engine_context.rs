use crate::config::EngineConfig;
use crate::engine::EngineHandle;
use crate::media::MediaSource;
use crate::relay::{CredentialSource, SignalingOutput};
use crate::session::SessionEvent;
use crate::transport::PeerConnectionFactory;
use dashmap::DashMap;
use std::sync::{Arc, Weak};
use tandem_core::ParticipantId;
use tokio::sync::mpsc;

pub(crate) type EngineRegistry = DashMap<ParticipantId, EngineHandle>;

/// Collaborators shared by every engine of one session manager.
#[derive(Clone)]
pub(crate) struct EngineContext {
    pub local: ParticipantId,
    pub config: Arc<EngineConfig>,
    pub signaling: Arc<dyn SignalingOutput>,
    pub credentials: Arc<dyn CredentialSource>,
    pub factory: Arc<dyn PeerConnectionFactory>,
    pub media: Arc<dyn MediaSource>,
    pub events: mpsc::UnboundedSender<SessionEvent>,
    pub registry: Weak<EngineRegistry>,
}
