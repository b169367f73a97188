use crate::engine::NegotiationState;
use tandem_core::{MediaKind, ParticipantId};

/// Notifications for whatever renders the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged {
        remote: ParticipantId,
        state: NegotiationState,
    },

    /// Remote media to render.
    RemoteTrack {
        remote: ParticipantId,
        kind: MediaKind,
        track_id: String,
    },

    /// The local media attached for `remote` changed.
    MediaChanged {
        remote: ParticipantId,
        audio: bool,
        video: bool,
    },

    /// The remote participant left and its record was discarded.
    Closed { remote: ParticipantId },

    /// The record never connected and was discarded.
    Expired { remote: ParticipantId },
}
