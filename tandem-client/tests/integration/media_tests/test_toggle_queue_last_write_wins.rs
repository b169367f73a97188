use tandem_client::{EngineCommand, NegotiationState};
use tandem_core::{MediaConstraints, SessionDescription, Signal, SignalKind};

use crate::integration::{init_tracing, test_config};
use crate::utils::{LoopbackRelay, ManualPeer, TestAgent, eventually, pid};

const AUDIO_ONLY: MediaConstraints = MediaConstraints {
    audio: true,
    video: false,
};

#[tokio::test]
async fn test_toggle_queue_last_write_wins() {
    init_tracing();

    let relay = LoopbackRelay::default();
    let bob = TestAgent::join(&relay, pid(1), test_config());
    let mut remote = ManualPeer::join(&relay, pid(2));

    let view = bob.observer(remote.id).await;
    remote.expect_signal(SignalKind::Offer).await;
    assert!(view.wait_for(NegotiationState::Negotiating).await);

    // Both land while the first offer is unanswered
    assert!(bob.manager.command(remote.id, EngineCommand::ToggleAudio).await);
    assert!(bob.manager.command(remote.id, EngineCommand::ToggleVideo).await);

    assert!(
        eventually(|| async { view.snapshot().await.queued_intent == Some(AUDIO_ONLY) }).await,
        "Toggles should compose relative to the queued target"
    );
    assert_eq!(view.snapshot().await.media, MediaConstraints::VIDEO_ONLY);

    remote.send(Signal::answer(bob.id, &SessionDescription::answer("first")));
    let second = remote.expect_signal(SignalKind::Offer).await;
    assert_eq!(second.from, Some(bob.id));

    let snapshot = view.snapshot().await;
    assert_eq!(snapshot.media, AUDIO_ONLY);
    assert_eq!(snapshot.queued_intent, None);
    assert!(snapshot.offer_outstanding);

    // Only the final intent was captured
    assert_eq!(
        bob.media.requests(),
        vec![MediaConstraints::VIDEO_ONLY, AUDIO_ONLY]
    );
    assert_eq!(bob.media.live_tracks(), 1);
    assert!(remote.no_signal_for(SignalKind::Offer, 200).await);
}
