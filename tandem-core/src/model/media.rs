use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Audio => f.write_str("audio"),
            Self::Video => f.write_str("video"),
        }
    }
}

/// Which kinds of local media to capture and send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl MediaConstraints {
    pub const NONE: Self = Self {
        audio: false,
        video: false,
    };

    pub const VIDEO_ONLY: Self = Self {
        audio: false,
        video: true,
    };

    pub const AUDIO_VIDEO: Self = Self {
        audio: true,
        video: true,
    };

    pub fn is_empty(&self) -> bool {
        !self.audio && !self.video
    }

    pub fn wants(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Audio => self.audio,
            MediaKind::Video => self.video,
        }
    }

    /// Audio+video becomes video-only, anything else becomes audio+video.
    pub fn toggled(self) -> Self {
        if self.audio && self.video {
            Self::VIDEO_ONLY
        } else {
            Self::AUDIO_VIDEO
        }
    }

    pub fn with_audio_toggled(self) -> Self {
        Self {
            audio: !self.audio,
            ..self
        }
    }

    pub fn with_video_toggled(self) -> Self {
        Self {
            video: !self.video,
            ..self
        }
    }
}

impl fmt::Display for MediaConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "audio={} video={}", self.audio, self.video)
    }
}
