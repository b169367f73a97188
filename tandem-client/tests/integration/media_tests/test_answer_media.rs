use tandem_client::EngineConfig;
use tandem_core::{MediaConstraints, SessionDescription, Signal, SignalKind};

use crate::integration::{init_tracing, waiting_config};
use crate::utils::{LoopbackRelay, ManualPeer, PcCall, TestAgent, pid};

#[tokio::test]
async fn test_answer_without_audio_still_sends_video() {
    init_tracing();

    let relay = LoopbackRelay::default();
    let config = EngineConfig {
        answer_audio: false,
        ..waiting_config()
    };
    let bob = TestAgent::join(&relay, pid(2), config);
    let mut remote = ManualPeer::join(&relay, pid(1));
    bob.observer(remote.id).await;

    remote.send(Signal::offer(bob.id, &SessionDescription::offer("hello")));
    remote.expect_signal(SignalKind::Answer).await;

    assert_eq!(bob.media.requests(), vec![MediaConstraints::VIDEO_ONLY]);
    let pc = bob.connection(remote.id).await;
    assert_eq!(pc.count(&PcCall::Attach(1)), 1);
}
