use tandem_core::ServerMessage;
use tandem_server::CredentialBroker;

use crate::integration::init_tracing;
use crate::utils::{TestParticipant, spawn_relay};

#[tokio::test]
async fn test_participants_are_welcomed() {
    init_tracing();

    let addr = spawn_relay(CredentialBroker::stun_only()).await;

    let mut alice = TestParticipant::connect(addr)
        .await
        .expect("Failed to connect alice");
    let mut bob = TestParticipant::connect(addr)
        .await
        .expect("Failed to connect bob");

    assert_ne!(alice.id, bob.id, "Identities must be unique per connection");

    // Only the participant that was already connected hears about the join
    let join = alice.recv().await.expect("Alice should hear about bob");
    assert_eq!(join, ServerMessage::Join { participant_id: bob.id });
    assert!(bob.is_silent_for(200).await, "The newcomer should not hear its own join");

    alice.close().await.expect("Failed to close alice");
    bob.close().await.expect("Failed to close bob");
}
