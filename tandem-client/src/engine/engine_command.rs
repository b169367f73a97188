use tandem_core::{MediaConstraints, Signal};

/// Inputs processed by an engine, one at a time.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Start or replace local media (caller path).
    Share(MediaConstraints),

    /// Audio+video becomes video-only, anything else audio+video.
    ToggleMedia,

    ToggleAudio,

    ToggleVideo,

    /// Relay-stamped signal from the remote participant.
    Signal(Signal),
}
