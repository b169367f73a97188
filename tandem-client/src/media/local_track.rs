use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tandem_core::{MediaConstraints, MediaKind};
use uuid::Uuid;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// One captured local track. Clones share the same liveness flag.
#[derive(Clone)]
pub struct LocalTrack {
    id: String,
    kind: MediaKind,
    rtc: Arc<TrackLocalStaticSample>,
    live: Arc<AtomicBool>,
}

impl LocalTrack {
    pub fn new(kind: MediaKind, stream_id: &str) -> Self {
        let id = format!("{}-{}", kind, Uuid::new_v4());
        let codec = match kind {
            MediaKind::Audio => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                ..Default::default()
            },
            MediaKind::Video => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                clock_rate: 90000,
                ..Default::default()
            },
        };
        let rtc = Arc::new(TrackLocalStaticSample::new(
            codec,
            id.clone(),
            stream_id.to_owned(),
        ));

        Self {
            id,
            kind,
            rtc,
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn rtc(&self) -> Arc<TrackLocalStaticSample> {
        Arc::clone(&self.rtc)
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.live.store(false, Ordering::Release);
    }
}

/// The tracks attached to one peer connection. Dropping the set stops them.
pub struct MediaTrackSet {
    stream_id: String,
    tracks: Vec<LocalTrack>,
}

impl MediaTrackSet {
    pub fn new(stream_id: impl Into<String>, tracks: Vec<LocalTrack>) -> Self {
        Self {
            stream_id: stream_id.into(),
            tracks,
        }
    }

    /// Builds one live track per requested kind.
    pub fn capture(constraints: MediaConstraints) -> Self {
        let stream_id = format!("tandem-{}", Uuid::new_v4());
        let tracks = [MediaKind::Audio, MediaKind::Video]
            .into_iter()
            .filter(|kind| constraints.wants(*kind))
            .map(|kind| LocalTrack::new(kind, &stream_id))
            .collect();
        Self::new(stream_id, tracks)
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    pub fn tracks(&self) -> &[LocalTrack] {
        &self.tracks
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn has(&self, kind: MediaKind) -> bool {
        self.tracks.iter().any(|track| track.kind == kind)
    }

    pub fn constraints(&self) -> MediaConstraints {
        MediaConstraints {
            audio: self.has(MediaKind::Audio),
            video: self.has(MediaKind::Video),
        }
    }

    pub fn stop(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }
}

impl Drop for MediaTrackSet {
    fn drop(&mut self) {
        self.stop();
    }
}
