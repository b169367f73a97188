use tandem_core::{ParticipantId, Signal};

/// What the relay tells an agent after the welcome handshake.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    Join(ParticipantId),
    Leave(ParticipantId),
    Signal(Signal),
}
