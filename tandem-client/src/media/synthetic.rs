use crate::error::MediaError;
use crate::media::{LocalTrack, MediaSource, MediaTrackSet};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tandem_core::{MediaConstraints, MediaKind};
use tracing::{debug, trace};
use webrtc::media::Sample;

const AUDIO_FRAME: Duration = Duration::from_millis(20);
const VIDEO_FRAME: Duration = Duration::from_millis(33);

static SILENT_FRAME: [u8; 160] = [0; 160];

/// Produces placeholder frames instead of real device capture.
#[derive(Debug, Default, Clone)]
pub struct SyntheticMediaSource;

impl SyntheticMediaSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MediaSource for SyntheticMediaSource {
    async fn acquire(&self, constraints: MediaConstraints) -> Result<MediaTrackSet, MediaError> {
        let set = MediaTrackSet::capture(constraints);
        debug!("Synthetic capture started ({})", constraints);

        for track in set.tracks() {
            tokio::spawn(pump(track.clone()));
        }
        Ok(set)
    }
}

/// Writes frames until the track is stopped.
async fn pump(track: LocalTrack) {
    let frame = match track.kind() {
        MediaKind::Audio => AUDIO_FRAME,
        MediaKind::Video => VIDEO_FRAME,
    };
    let rtc = track.rtc();
    let mut ticker = tokio::time::interval(frame);

    while track.is_live() {
        ticker.tick().await;
        let sample = Sample {
            data: Bytes::from_static(&SILENT_FRAME),
            duration: frame,
            ..Default::default()
        };
        if let Err(e) = rtc.write_sample(&sample).await {
            trace!("Dropped synthetic frame on {}: {}", track.id(), e);
        }
    }
    debug!("Synthetic track {} stopped", track.id());
}
