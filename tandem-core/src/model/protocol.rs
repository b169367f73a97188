use crate::model::ice::IceServerConfig;
use crate::model::participant::ParticipantId;
use crate::model::signaling::Signal;
use serde::{Deserialize, Serialize};

/// Frames a participant sends to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d", rename_all = "snake_case")]
pub enum ClientMessage {
    Signal(Signal),
    RequestIceServers,
}

/// Frames the relay sends to a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome { participant_id: ParticipantId },
    Join { participant_id: ParticipantId },
    Leave { participant_id: ParticipantId },
    Signal(Signal),
    IceServers { ice_servers: Vec<IceServerConfig> },
}
