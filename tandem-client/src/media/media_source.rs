use crate::error::MediaError;
use crate::media::MediaTrackSet;
use async_trait::async_trait;
use tandem_core::MediaConstraints;

/// Local capture, e.g. camera and microphone.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Returns a fresh set of live tracks matching `constraints`.
    async fn acquire(&self, constraints: MediaConstraints) -> Result<MediaTrackSet, MediaError>;
}
