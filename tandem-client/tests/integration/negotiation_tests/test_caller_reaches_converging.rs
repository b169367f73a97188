use tandem_client::NegotiationState;
use tandem_core::{MediaConstraints, SdpKind, SignalKind};

use crate::integration::{init_tracing, test_config};
use crate::utils::{LoopbackRelay, PcCall, TestAgent, pid};

#[tokio::test]
async fn test_caller_reaches_converging() {
    init_tracing();

    let relay = LoopbackRelay::default();
    let alice = TestAgent::join(&relay, pid(1), test_config());
    let bob = TestAgent::join(&relay, pid(2), test_config());

    // Alice was there first, so alice hears the join and calls
    let alice_view = alice.observer(bob.id).await;
    assert!(alice_view.wait_for(NegotiationState::Converging).await);
    let bob_view = bob.observer(alice.id).await;
    assert!(bob_view.wait_for(NegotiationState::Converging).await);

    let offers = relay.routed_between(alice.id, bob.id, SignalKind::Offer);
    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0].from, Some(alice.id));
    assert_eq!(
        relay.routed_between(bob.id, alice.id, SignalKind::Answer).len(),
        1
    );

    let alice_pc = alice.connection(bob.id).await;
    assert_eq!(
        alice_pc.calls(),
        vec![
            PcCall::Attach(1),
            PcCall::CreateOffer,
            PcCall::SetLocal(SdpKind::Offer),
            PcCall::SetRemote(SdpKind::Answer),
        ]
    );

    let bob_pc = bob.connection(alice.id).await;
    assert_eq!(
        bob_pc.calls(),
        vec![
            PcCall::SetRemote(SdpKind::Offer),
            PcCall::Attach(2),
            PcCall::CreateAnswer,
            PcCall::SetLocal(SdpKind::Answer),
        ]
    );

    // Caller sends video only, callee answers with audio+video
    assert_eq!(alice.media.requests(), vec![MediaConstraints::VIDEO_ONLY]);
    assert_eq!(bob.media.requests(), vec![MediaConstraints::AUDIO_VIDEO]);

    // Credentials are fetched once per record, before the peer connection
    assert_eq!(alice.credentials.calls(), 1);
    assert_eq!(bob.credentials.calls(), 1);
    assert_eq!(
        alice_view.snapshot().await.ice_servers,
        Some(alice_pc.ice_servers.clone())
    );
}
