use std::time::Duration;
use tandem_core::MediaConstraints;

/// When locally generated ICE candidates are relayed to the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TricklePolicy {
    #[default]
    Always,
    /// Stop relaying once ICE reports connectivity.
    SuppressWhenConnected,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub trickle_policy: TricklePolicy,
    /// Media offered to a participant as soon as it joins.
    /// `MediaConstraints::NONE` waits for the remote side to offer.
    pub initial_media: MediaConstraints,
    /// Whether audio joins the video captured when answering without
    /// anything attached yet.
    pub answer_audio: bool,
    /// Records that never reach `Connected` are torn down after this long.
    pub negotiation_timeout: Option<Duration>,
    /// How long to wait for the relay to answer an ICE server request.
    pub credential_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trickle_policy: TricklePolicy::Always,
            initial_media: MediaConstraints::VIDEO_ONLY,
            answer_audio: true,
            negotiation_timeout: Some(Duration::from_secs(30)),
            credential_timeout: Duration::from_secs(5),
        }
    }
}

impl EngineConfig {
    /// Media captured on the answering side. Video is always included.
    pub fn answer_media(&self) -> MediaConstraints {
        MediaConstraints {
            audio: self.answer_audio,
            video: true,
        }
    }
}
