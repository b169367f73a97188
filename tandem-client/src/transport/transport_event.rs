use tandem_core::{IceCandidate, MediaKind, ParticipantId};

/// Peer connection callbacks, forwarded into the owning engine's loop.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A local candidate was gathered and should be trickled to the remote side.
    CandidateGenerated(ParticipantId, IceCandidate),

    /// ICE connectivity came up (`true`) or was lost (`false`).
    ConnectivityChanged(ParticipantId, bool),

    /// The remote side started sending a track.
    RemoteTrack {
        remote: ParticipantId,
        kind: MediaKind,
        track_id: String,
    },
}
