mod ice;
mod media;
mod participant;
mod protocol;
mod signaling;

pub use ice::IceServerConfig;
pub use media::{MediaConstraints, MediaKind};
pub use participant::ParticipantId;
pub use protocol::{ClientMessage, ServerMessage};
pub use signaling::{IceCandidate, SdpKind, SessionDescription, Signal, SignalKind};
