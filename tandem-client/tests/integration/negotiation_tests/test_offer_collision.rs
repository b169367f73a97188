use tandem_client::NegotiationState;
use tandem_core::{MediaConstraints, SdpKind, SessionDescription, Signal, SignalKind};

use crate::integration::{init_tracing, test_config};
use crate::utils::{LoopbackRelay, ManualPeer, PcCall, TestAgent, eventually, pid};

#[tokio::test]
async fn test_polite_side_rolls_back() {
    init_tracing();

    let relay = LoopbackRelay::default();
    // Lower identity is the polite one
    let bob = TestAgent::join(&relay, pid(1), test_config());
    let mut remote = ManualPeer::join(&relay, pid(2));

    let view = bob.observer(remote.id).await;
    remote.expect_signal(SignalKind::Offer).await;
    assert!(view.wait_for(NegotiationState::Negotiating).await);

    remote.send(Signal::offer(bob.id, &SessionDescription::offer("their-offer")));

    let answer = remote.expect_signal(SignalKind::Answer).await;
    assert_eq!(answer.from, Some(bob.id));
    // The rolled back intent is offered again right after answering
    remote.expect_signal(SignalKind::Offer).await;

    let pc = bob.connection(remote.id).await;
    assert!(
        eventually(|| async { pc.count(&PcCall::CreateOffer) == 2 }).await,
        "Bob should re-offer after the collision"
    );
    let calls = pc.calls();
    let rollback = calls
        .iter()
        .position(|c| *c == PcCall::Rollback)
        .expect("rollback");
    assert_eq!(calls[rollback + 1], PcCall::SetRemote(SdpKind::Offer));
    assert_eq!(calls[rollback + 2], PcCall::CreateAnswer);
    assert_eq!(calls[rollback + 3], PcCall::SetLocal(SdpKind::Answer));

    // Media from the first offer is kept, not captured again
    assert_eq!(bob.media.requests(), vec![MediaConstraints::VIDEO_ONLY]);
    assert!(eventually(|| async { view.snapshot().await.offer_outstanding }).await);
    assert_eq!(view.snapshot().await.queued_intent, None);
}

#[tokio::test]
async fn test_impolite_side_ignores_remote_offer() {
    init_tracing();

    let relay = LoopbackRelay::default();
    let bob = TestAgent::join(&relay, pid(2), test_config());
    let mut remote = ManualPeer::join(&relay, pid(1));

    let view = bob.observer(remote.id).await;
    remote.expect_signal(SignalKind::Offer).await;
    assert!(view.wait_for(NegotiationState::Negotiating).await);

    remote.send(Signal::offer(bob.id, &SessionDescription::offer("their-offer")));
    assert!(remote.no_signal_for(SignalKind::Answer, 200).await);

    let pc = bob.connection(remote.id).await;
    assert_eq!(pc.count(&PcCall::SetRemote(SdpKind::Offer)), 0);
    assert_eq!(pc.count(&PcCall::Rollback), 0);
    assert_eq!(view.state(), NegotiationState::Negotiating);

    // The remote side, being polite, answers ours instead
    remote.send(Signal::answer(bob.id, &SessionDescription::answer("their-answer")));
    assert!(view.wait_for(NegotiationState::Converging).await);
}
