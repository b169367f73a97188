use std::sync::Arc;
use std::time::Duration;
use tandem_client::{NegotiationState, SessionCommand, SessionManager, WsRelayClient};
use tokio::sync::mpsc;

use super::spawn_relay;
use crate::integration::{init_tracing, test_config};
use crate::utils::{MockFactory, ScriptedMediaSource, eventually};

struct RelayAgent {
    client: Arc<WsRelayClient>,
    manager: SessionManager,
    factory: Arc<MockFactory>,
    _commands: mpsc::Sender<SessionCommand>,
}

async fn start_agent(url: &str) -> RelayAgent {
    let (client, relay_rx) = WsRelayClient::connect(url, Duration::from_secs(1))
        .await
        .expect("Failed to connect agent");
    let client = Arc::new(client);
    let factory = Arc::new(MockFactory::default());

    let (manager, _events) = SessionManager::new(
        client.local_id(),
        test_config(),
        client.clone(),
        client.clone(),
        factory.clone(),
        Arc::new(ScriptedMediaSource::default()),
    );
    let (commands, command_rx) = mpsc::channel(8);
    tokio::spawn(manager.clone().run(relay_rx, command_rx));

    RelayAgent {
        client,
        manager,
        factory,
        _commands: commands,
    }
}

#[tokio::test]
async fn test_agents_negotiate_over_relay() {
    init_tracing();

    let url = spawn_relay().await;
    let alice = start_agent(&url).await;
    let bob = start_agent(&url).await;
    let alice_id = alice.client.local_id();
    let bob_id = bob.client.local_id();

    assert!(eventually(|| async { alice.manager.contains(&bob_id) }).await);
    let alice_view = alice.manager.observer(&bob_id).expect("alice record");
    assert!(alice_view.wait_for(NegotiationState::Converging).await);

    assert!(eventually(|| async { bob.manager.contains(&alice_id) }).await);
    let bob_view = bob.manager.observer(&alice_id).expect("bob record");
    assert!(bob_view.wait_for(NegotiationState::Converging).await);

    // Each side asked the relay for ice servers before building its connection
    let alice_pc = alice.factory.connection(bob_id).expect("alice pc");
    assert!(!alice_pc.ice_servers.is_empty());
    assert_eq!(bob.factory.created(), 1);

    alice.client.close();
    assert!(
        eventually(|| async { !bob.manager.contains(&alice_id) }).await,
        "Bob should drop the record once alice leaves"
    );
}
