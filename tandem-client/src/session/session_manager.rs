use crate::config::EngineConfig;
use crate::engine::{Engine, EngineCommand, EngineContext, EngineObserver, EngineRegistry};
use crate::media::MediaSource;
use crate::relay::{CredentialSource, RelayEvent, SignalingOutput};
use crate::session::{SessionCommand, SessionEvent};
use crate::transport::PeerConnectionFactory;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tandem_core::{ParticipantId, Signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Owns one engine record per remote participant.
#[derive(Clone)]
pub struct SessionManager {
    ctx: EngineContext,
    engines: Arc<EngineRegistry>,
}

impl SessionManager {
    pub fn new(
        local: ParticipantId,
        config: EngineConfig,
        signaling: Arc<dyn SignalingOutput>,
        credentials: Arc<dyn CredentialSource>,
        factory: Arc<dyn PeerConnectionFactory>,
        media: Arc<dyn MediaSource>,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let engines = Arc::new(DashMap::new());

        let ctx = EngineContext {
            local,
            config: Arc::new(config),
            signaling,
            credentials,
            factory,
            media,
            events,
            registry: Arc::downgrade(&engines),
        };

        (Self { ctx, engines }, events_rx)
    }

    pub fn local_id(&self) -> ParticipantId {
        self.ctx.local
    }

    pub fn contains(&self, remote: &ParticipantId) -> bool {
        self.engines.contains_key(remote)
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    pub fn remotes(&self) -> Vec<ParticipantId> {
        self.engines.iter().map(|entry| *entry.key()).collect()
    }

    pub fn observer(&self, remote: &ParticipantId) -> Option<EngineObserver> {
        self.engines
            .get(remote)
            .map(|handle| handle.observer(*remote))
    }

    pub async fn handle_relay_event(&self, event: RelayEvent) {
        match event {
            RelayEvent::Join(remote) => {
                if remote == self.ctx.local {
                    return;
                }
                if !self.create(remote) {
                    warn!("Duplicate join for {}, keeping existing record", remote);
                    return;
                }
                let initial = self.ctx.config.initial_media;
                if !initial.is_empty() {
                    self.command(remote, EngineCommand::Share(initial)).await;
                }
            }

            RelayEvent::Leave(remote) => {
                if remote == self.ctx.local {
                    return;
                }
                if !self.remove(remote).await {
                    debug!("Leave for {} without a record", remote);
                }
            }

            RelayEvent::Signal(signal) => self.route_signal(signal).await,
        }
    }

    async fn route_signal(&self, signal: Signal) {
        let Some(from) = signal.from else {
            warn!("Dropping {} signal without sender", signal.kind);
            return;
        };
        if from == self.ctx.local {
            return;
        }
        if signal.to != self.ctx.local {
            warn!("Dropping {} from {} addressed to {}", signal.kind, from, signal.to);
            return;
        }

        if !self.contains(&from) {
            if signal.kind != SignalKind::Offer {
                warn!("Dropping unsolicited {} from {}", signal.kind, from);
                return;
            }
            if let Err(e) = signal.description() {
                warn!("Dropping unsolicited offer from {}: {}", from, e);
                return;
            }
            self.create(from);
        }

        self.command(from, EngineCommand::Signal(signal)).await;
    }

    /// Starts an engine for `remote`. False if one already exists.
    pub fn create(&self, remote: ParticipantId) -> bool {
        match self.engines.entry(remote) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Engine::spawn(remote, self.ctx.clone()));
                info!("Created session record for {}", remote);
                true
            }
        }
    }

    /// Queues `cmd` on the engine for `remote`. False if there is none.
    pub async fn command(&self, remote: ParticipantId, cmd: EngineCommand) -> bool {
        let Some(command_tx) = self
            .engines
            .get(&remote)
            .map(|handle| handle.command_tx.clone())
        else {
            warn!("No session with {}", remote);
            return false;
        };
        command_tx.send(cmd).await.is_ok()
    }

    /// Applies `cmd` to every open session.
    pub async fn broadcast(&self, cmd: SessionCommand) {
        for remote in self.remotes() {
            self.command(remote, cmd.into()).await;
        }
    }

    /// Cancels the engine, releases local media and closes the connection.
    pub async fn remove(&self, remote: ParticipantId) -> bool {
        let Some((_, handle)) = self.engines.remove(&remote) else {
            return false;
        };

        handle.task.abort();
        let _ = handle.task.await;
        handle.record.lock().await.teardown().await;

        info!("Discarded session record for {}", remote);
        let _ = self.ctx.events.send(SessionEvent::Closed { remote });
        true
    }

    pub async fn shutdown(&self) {
        for remote in self.remotes() {
            self.remove(remote).await;
        }
    }

    /// Feeds relay events and local commands until the relay channel closes.
    pub async fn run(
        self,
        mut relay_rx: mpsc::Receiver<RelayEvent>,
        mut command_rx: mpsc::Receiver<SessionCommand>,
    ) {
        info!("Session manager for {} started", self.ctx.local);

        loop {
            tokio::select! {
                evt = relay_rx.recv() => {
                    match evt {
                        Some(e) => self.handle_relay_event(e).await,
                        None => {
                            info!("Relay channel closed. Shutting down sessions.");
                            break;
                        }
                    }
                }

                Some(cmd) = command_rx.recv() => {
                    self.broadcast(cmd).await;
                }
            }
        }

        self.shutdown().await;
    }
}
