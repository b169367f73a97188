use crate::config::TricklePolicy;
use crate::engine::{
    EngineCommand, EngineContext, EngineHandle, EngineRecord, NegotiationState,
};
use crate::error::{NegotiationError, NegotiationStep, StepResultExt};
use crate::media::MediaTrackSet;
use crate::session::SessionEvent;
use crate::transport::{PeerConnection, TransportEvent};
use std::sync::Arc;
use tandem_core::{IceCandidate, MediaConstraints, ParticipantId, SessionDescription, Signal, SignalKind};
use tokio::sync::{Mutex, mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

type StepResult = Result<(), NegotiationError>;

/// Drives the offer/answer/ICE lifecycle with one remote participant.
///
/// Commands, relay signals and peer connection callbacks are handled strictly
/// in order; each step runs to completion before the next input is looked at.
pub struct Engine {
    remote: ParticipantId,
    ctx: EngineContext,
    record: Arc<Mutex<EngineRecord>>,
    command_rx: mpsc::Receiver<EngineCommand>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    transport_tx: mpsc::Sender<TransportEvent>,
    state_tx: watch::Sender<NegotiationState>,
    deadline: Option<Instant>,
}

impl Engine {
    pub(crate) fn spawn(remote: ParticipantId, ctx: EngineContext) -> EngineHandle {
        let (command_tx, command_rx) = mpsc::channel(100);
        let (transport_tx, transport_rx) = mpsc::channel(256);
        let (state_tx, state_rx) = watch::channel(NegotiationState::Idle);
        let record = Arc::new(Mutex::new(EngineRecord::new(remote)));

        let engine = Self {
            remote,
            ctx,
            record: Arc::clone(&record),
            command_rx,
            transport_rx,
            transport_tx,
            state_tx,
            deadline: None,
        };
        let task = tokio::spawn(engine.run());

        EngineHandle {
            command_tx,
            record,
            state_rx,
            task,
        }
    }

    pub async fn run(mut self) {
        info!("Engine for {} started", self.remote);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            debug!("Command channel for {} closed", self.remote);
                            break;
                        }
                    }
                }

                Some(evt) = self.transport_rx.recv() => {
                    self.handle_transport_event(evt).await;
                }

                _ = deadline_elapsed(self.deadline) => {
                    self.expire().await;
                    break;
                }
            }
        }

        info!("Engine for {} finished", self.remote);
    }

    async fn handle_command(&mut self, cmd: EngineCommand) {
        let record = Arc::clone(&self.record);
        let mut record = record.lock().await;

        let answering = matches!(
            &cmd,
            EngineCommand::Signal(signal) if signal.kind == SignalKind::Answer
        );
        let result = match cmd {
            EngineCommand::Share(constraints) => self.start_media(&mut record, constraints).await,
            EngineCommand::ToggleMedia => self.toggle(&mut record, MediaConstraints::toggled).await,
            EngineCommand::ToggleAudio => {
                self.toggle(&mut record, MediaConstraints::with_audio_toggled)
                    .await
            }
            EngineCommand::ToggleVideo => {
                self.toggle(&mut record, MediaConstraints::with_video_toggled)
                    .await
            }
            EngineCommand::Signal(signal) => self.handle_signal(&mut record, signal).await,
        };

        if let Err(e) = result {
            error!("Negotiation with {} abandoned: {}", self.remote, e);
            if answering && record.offer_outstanding {
                self.abandon_offer(&mut record).await;
            }
            self.arm_deadline(&record);
        }
        self.publish(&record);
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        let record = Arc::clone(&self.record);
        let mut record = record.lock().await;

        match event {
            TransportEvent::CandidateGenerated(_, candidate) => {
                if self.ctx.config.trickle_policy == TricklePolicy::SuppressWhenConnected
                    && record.ice_connected
                {
                    debug!("Connected to {}, not relaying local candidate", self.remote);
                } else if let Err(e) = self
                    .ctx
                    .signaling
                    .send_signal(Signal::ice_candidate(self.remote, &candidate))
                    .await
                {
                    warn!("Failed to relay local candidate to {}: {}", self.remote, e);
                }
            }

            TransportEvent::ConnectivityChanged(_, connected) => {
                record.ice_connected = connected;
                if connected {
                    self.deadline = None;
                    info!("ICE connected with {}", self.remote);
                } else {
                    warn!("ICE connectivity with {} lost", self.remote);
                }
            }

            TransportEvent::RemoteTrack { kind, track_id, .. } => {
                info!("Receiving {} from {}", kind, self.remote);
                self.emit(SessionEvent::RemoteTrack {
                    remote: self.remote,
                    kind,
                    track_id,
                });
            }
        }

        self.publish(&record);
    }

    async fn handle_signal(&mut self, record: &mut EngineRecord, signal: Signal) -> StepResult {
        debug!("<- {} from {}", signal.kind, self.remote);

        match &signal.kind {
            SignalKind::Offer => {
                let offer = signal.description()?;
                self.handle_offer(record, offer).await
            }
            SignalKind::Answer => {
                let answer = signal.description()?;
                self.handle_answer(record, answer).await
            }
            SignalKind::IceCandidate => {
                let candidate = signal.candidate()?;
                self.handle_candidate(record, candidate).await
            }
            SignalKind::Other(kind) => {
                warn!("Dropping signal of unknown type '{}' from {}", kind, self.remote);
                Ok(())
            }
        }
    }

    async fn toggle(
        &mut self,
        record: &mut EngineRecord,
        flip: fn(MediaConstraints) -> MediaConstraints,
    ) -> StepResult {
        if record.state() == NegotiationState::Idle {
            warn!("No session with {} yet, ignoring media toggle", self.remote);
            return Ok(());
        }

        let target = flip(record.media_target());
        self.start_media(record, target).await
    }

    /// Caller path: replace local media and offer it.
    async fn start_media(
        &mut self,
        record: &mut EngineRecord,
        constraints: MediaConstraints,
    ) -> StepResult {
        if constraints.is_empty() {
            debug!("Nothing requested for {}", self.remote);
            return Ok(());
        }

        if record.offer_outstanding {
            info!(
                "Offer to {} outstanding, queueing ({})",
                self.remote, constraints
            );
            record.queued_intent = Some(constraints);
            return Ok(());
        }

        let pc = self.ensure_peer_connection(record).await?;
        if record.media.is_none() || record.media_constraints() != constraints {
            let media = self.ctx.media.acquire(constraints).await?;
            self.replace_media(record, &pc, media).await?;
        } else {
            debug!("Already sending {} to {}, re-offering", constraints, self.remote);
        }

        let offer = pc.create_offer().await.step(NegotiationStep::CreateOffer)?;
        pc.set_local_description(offer.clone())
            .await
            .step(NegotiationStep::SetLocalDescription)?;
        self.ctx
            .signaling
            .send_signal(Signal::offer(self.remote, &offer))
            .await?;

        record.offer_outstanding = true;
        self.arm_deadline(record);
        info!("Sent offer to {} ({})", self.remote, constraints);
        Ok(())
    }

    /// Callee path, also used for renegotiation offers on a live record.
    async fn handle_offer(&mut self, record: &mut EngineRecord, offer: SessionDescription) -> StepResult {
        if record.offer_outstanding {
            if self.ctx.local < self.remote {
                info!("Offer collision with {}, rolling back ours", self.remote);
                if let Some(pc) = record.peer_connection.clone() {
                    pc.rollback().await.step(NegotiationStep::Rollback)?;
                }
                record.offer_outstanding = false;
                if record.queued_intent.is_none() {
                    record.queued_intent = Some(record.media_constraints());
                }
            } else {
                warn!("Offer collision with {}, ignoring theirs", self.remote);
                return Ok(());
            }
        }

        let pc = self.ensure_peer_connection(record).await?;
        pc.set_remote_description(offer)
            .await
            .step(NegotiationStep::SetRemoteDescription)?;
        record.remote_description_accepted = true;
        self.drain_candidates(record, pc.as_ref()).await;

        if !record.ice_connected && record.media.is_none() {
            let media = self.ctx.media.acquire(self.ctx.config.answer_media()).await?;
            self.replace_media(record, &pc, media).await?;
        }

        let answer = pc.create_answer().await.step(NegotiationStep::CreateAnswer)?;
        pc.set_local_description(answer.clone())
            .await
            .step(NegotiationStep::SetLocalDescription)?;
        self.ctx
            .signaling
            .send_signal(Signal::answer(self.remote, &answer))
            .await?;

        self.arm_deadline(record);
        info!("Answered offer from {}", self.remote);
        self.run_queued(record).await
    }

    async fn handle_answer(&mut self, record: &mut EngineRecord, answer: SessionDescription) -> StepResult {
        if !record.offer_outstanding {
            warn!("Dropping answer from {}: no offer outstanding", self.remote);
            return Ok(());
        }
        let Some(pc) = record.peer_connection.clone() else {
            warn!("Dropping answer from {}: no peer connection", self.remote);
            return Ok(());
        };

        pc.set_remote_description(answer)
            .await
            .step(NegotiationStep::SetRemoteDescription)?;
        record.remote_description_accepted = true;
        self.drain_candidates(record, pc.as_ref()).await;
        record.offer_outstanding = false;

        info!("Offer to {} answered", self.remote);
        self.run_queued(record).await
    }

    async fn handle_candidate(&mut self, record: &mut EngineRecord, candidate: IceCandidate) -> StepResult {
        let pc = record
            .peer_connection
            .clone()
            .filter(|_| record.remote_description_accepted);

        match pc {
            Some(pc) => pc
                .add_ice_candidate(candidate)
                .await
                .step(NegotiationStep::AddIceCandidate),
            None => {
                record.pending_candidates.push(candidate);
                debug!(
                    "Buffered candidate from {} ({} pending)",
                    self.remote,
                    record.pending_candidates.len()
                );
                Ok(())
            }
        }
    }

    /// Applies buffered candidates in arrival order and empties the buffer.
    async fn drain_candidates(&self, record: &mut EngineRecord, pc: &dyn PeerConnection) {
        let pending = std::mem::take(&mut record.pending_candidates);
        if pending.is_empty() {
            return;
        }

        debug!("Applying {} buffered candidates from {}", pending.len(), self.remote);
        for candidate in pending {
            if let Err(e) = pc.add_ice_candidate(candidate).await {
                warn!(
                    "{} failed for buffered candidate from {}: {:#}",
                    NegotiationStep::AddIceCandidate,
                    self.remote,
                    e
                );
            }
        }
    }

    async fn run_queued(&mut self, record: &mut EngineRecord) -> StepResult {
        let Some(intent) = record.queued_intent.take() else {
            return Ok(());
        };
        info!("Running queued media change for {} ({})", self.remote, intent);
        self.start_media(record, intent).await
    }

    /// Gives up on the local offer whose answer could not be applied, so the
    /// next offer in either direction is not blocked behind it.
    async fn abandon_offer(&mut self, record: &mut EngineRecord) {
        if let Some(pc) = record.peer_connection.clone()
            && let Err(e) = pc.rollback().await
        {
            warn!(
                "{} of unanswered offer to {} failed: {:#}",
                NegotiationStep::Rollback,
                self.remote,
                e
            );
        }
        record.offer_outstanding = false;

        if let Some(intent) = record.queued_intent.take() {
            warn!(
                "Dropping queued media change for {} ({}) with its offer",
                self.remote, intent
            );
        }
    }

    async fn ensure_peer_connection(
        &mut self,
        record: &mut EngineRecord,
    ) -> Result<Arc<dyn PeerConnection>, NegotiationError> {
        if let Some(pc) = &record.peer_connection {
            return Ok(Arc::clone(pc));
        }

        let ice_servers = match &record.ice_servers {
            Some(servers) => servers.clone(),
            None => {
                let servers = self.ctx.credentials.ice_servers().await;
                record.ice_servers = Some(servers.clone());
                servers
            }
        };

        let pc = self
            .ctx
            .factory
            .create(self.remote, &ice_servers, self.transport_tx.clone())
            .await
            .step(NegotiationStep::CreatePeerConnection)?;
        record.peer_connection = Some(Arc::clone(&pc));

        debug!(
            "Peer connection to {} created with {} ice servers",
            self.remote,
            ice_servers.len()
        );
        Ok(pc)
    }

    /// Swaps the attached set. The old set is detached before the new one is
    /// attached; if detaching fails the old set stays in place.
    async fn replace_media(
        &mut self,
        record: &mut EngineRecord,
        pc: &Arc<dyn PeerConnection>,
        media: MediaTrackSet,
    ) -> StepResult {
        if let Some(old) = record.media.take() {
            if let Err(e) = pc.detach_media().await {
                record.media = Some(old);
                return Err(NegotiationError::Step {
                    step: NegotiationStep::DetachMedia,
                    source: e,
                });
            }
            old.stop();
        }

        if !media.is_empty() {
            pc.attach_media(&media)
                .await
                .step(NegotiationStep::AttachMedia)?;
            record.media = Some(media);
        }

        let sending = record.media_constraints();
        self.emit(SessionEvent::MediaChanged {
            remote: self.remote,
            audio: sending.audio,
            video: sending.video,
        });
        Ok(())
    }

    fn arm_deadline(&mut self, record: &EngineRecord) {
        if record.ice_connected || self.deadline.is_some() {
            return;
        }
        if let Some(timeout) = self.ctx.config.negotiation_timeout {
            self.deadline = Some(Instant::now() + timeout);
        }
    }

    async fn expire(&mut self) {
        warn!(
            "Negotiation with {} did not connect in time, tearing down",
            self.remote
        );

        let record = Arc::clone(&self.record);
        let mut record = record.lock().await;
        record.teardown().await;
        self.publish(&record);

        if let Some(registry) = self.ctx.registry.upgrade() {
            registry.remove_if(&self.remote, |_, handle| {
                Arc::ptr_eq(&handle.record, &self.record)
            });
        }
        self.emit(SessionEvent::Expired {
            remote: self.remote,
        });
    }

    fn publish(&self, record: &EngineRecord) {
        let state = record.state();
        let changed = self.state_tx.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });

        if changed {
            debug!("Session with {} is {}", self.remote, state);
            self.emit(SessionEvent::StateChanged {
                remote: self.remote,
                state,
            });
        }
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.ctx.events.send(event);
    }
}

async fn deadline_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
