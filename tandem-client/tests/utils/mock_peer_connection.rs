use anyhow::{Result, bail};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tandem_client::{MediaTrackSet, PeerConnection, PeerConnectionFactory, TransportEvent};
use tandem_core::{
    IceCandidate, IceServerConfig, MediaKind, ParticipantId, SdpKind, SessionDescription,
};
use tokio::sync::mpsc;

/// Everything the engine asked a peer connection to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PcCall {
    CreateOffer,
    CreateAnswer,
    SetLocal(SdpKind),
    SetRemote(SdpKind),
    Rollback,
    AddCandidate(String),
    Attach(usize),
    Detach,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignalingState {
    Stable,
    HaveLocalOffer,
    HaveRemoteOffer,
}

struct MockState {
    calls: Vec<PcCall>,
    signaling: SignalingState,
    has_remote_description: bool,
    attached: Option<usize>,
    double_attach: usize,
    descriptions: usize,
    failures: Vec<PcCall>,
}

impl MockState {
    /// Fails `call` once if a failure was scripted for it.
    fn scripted_failure(&mut self, call: &PcCall) -> Result<()> {
        if let Some(at) = self.failures.iter().position(|f| f == call) {
            self.failures.remove(at);
            bail!("scripted failure of {:?}", call);
        }
        Ok(())
    }
}

/// Peer connection that records calls and enforces offer/answer ordering.
pub struct MockPeerConnection {
    pub remote: ParticipantId,
    pub ice_servers: Vec<IceServerConfig>,
    events: mpsc::Sender<TransportEvent>,
    state: Mutex<MockState>,
}

impl MockPeerConnection {
    fn new(
        remote: ParticipantId,
        ice_servers: Vec<IceServerConfig>,
        events: mpsc::Sender<TransportEvent>,
        failures: Vec<PcCall>,
    ) -> Self {
        Self {
            remote,
            ice_servers,
            events,
            state: Mutex::new(MockState {
                calls: Vec::new(),
                signaling: SignalingState::Stable,
                has_remote_description: false,
                attached: None,
                double_attach: 0,
                descriptions: 0,
                failures,
            }),
        }
    }

    fn record(&self, call: PcCall) {
        self.state.lock().unwrap().calls.push(call);
    }

    pub fn calls(&self) -> Vec<PcCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: &PcCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn applied_candidates(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PcCall::AddCandidate(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    /// Makes the next matching call fail without changing any state.
    pub fn fail_next(&self, call: PcCall) {
        self.state.lock().unwrap().failures.push(call);
    }

    /// Number of tracks currently attached.
    pub fn attached(&self) -> Option<usize> {
        self.state.lock().unwrap().attached
    }

    /// Times a set was attached on top of another one.
    pub fn double_attach(&self) -> usize {
        self.state.lock().unwrap().double_attach
    }

    pub fn is_closed(&self) -> bool {
        self.calls().contains(&PcCall::Close)
    }

    pub async fn connect(&self) {
        self.emit(TransportEvent::ConnectivityChanged(self.remote, true))
            .await;
    }

    pub async fn generate_candidate(&self, candidate: &str) {
        self.emit(TransportEvent::CandidateGenerated(
            self.remote,
            IceCandidate::new(candidate),
        ))
        .await;
    }

    pub async fn remote_track(&self, kind: MediaKind) {
        self.emit(TransportEvent::RemoteTrack {
            remote: self.remote,
            kind,
            track_id: format!("remote-{}", kind),
        })
        .await;
    }

    async fn emit(&self, event: TransportEvent) {
        self.events
            .send(event)
            .await
            .expect("Engine stopped listening");
    }
}

#[async_trait]
impl PeerConnection for MockPeerConnection {
    async fn create_offer(&self) -> Result<SessionDescription> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(PcCall::CreateOffer);
        state.scripted_failure(&PcCall::CreateOffer)?;
        state.descriptions += 1;
        Ok(SessionDescription::offer(format!(
            "mock-offer-{}",
            state.descriptions
        )))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(PcCall::CreateAnswer);
        state.scripted_failure(&PcCall::CreateAnswer)?;
        if state.signaling != SignalingState::HaveRemoteOffer {
            bail!("create_answer in {:?}", state.signaling);
        }
        state.descriptions += 1;
        Ok(SessionDescription::answer(format!(
            "mock-answer-{}",
            state.descriptions
        )))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(PcCall::SetLocal(desc.kind));
        state.scripted_failure(&PcCall::SetLocal(desc.kind))?;
        state.signaling = match (state.signaling, desc.kind) {
            (SignalingState::Stable | SignalingState::HaveLocalOffer, SdpKind::Offer) => {
                SignalingState::HaveLocalOffer
            }
            (SignalingState::HaveRemoteOffer, SdpKind::Answer) => SignalingState::Stable,
            (current, kind) => bail!("local {:?} in {:?}", kind, current),
        };
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(PcCall::SetRemote(desc.kind));
        state.scripted_failure(&PcCall::SetRemote(desc.kind))?;
        state.signaling = match (state.signaling, desc.kind) {
            (SignalingState::Stable | SignalingState::HaveRemoteOffer, SdpKind::Offer) => {
                SignalingState::HaveRemoteOffer
            }
            (SignalingState::HaveLocalOffer, SdpKind::Answer) => SignalingState::Stable,
            (current, kind) => bail!("remote {:?} in {:?}", kind, current),
        };
        state.has_remote_description = true;
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(PcCall::Rollback);
        state.scripted_failure(&PcCall::Rollback)?;
        if state.signaling != SignalingState::HaveLocalOffer {
            bail!("rollback in {:?}", state.signaling);
        }
        state.signaling = SignalingState::Stable;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.has_remote_description {
            bail!("candidate before remote description");
        }
        let call = PcCall::AddCandidate(candidate.candidate);
        state.scripted_failure(&call)?;
        state.calls.push(call);
        Ok(())
    }

    async fn attach_media(&self, media: &MediaTrackSet) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(PcCall::Attach(media.tracks().len()));
        if state.attached.is_some() {
            state.double_attach += 1;
        }
        state.attached = Some(media.tracks().len());
        Ok(())
    }

    async fn detach_media(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(PcCall::Detach);
        state.attached = None;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.record(PcCall::Close);
        Ok(())
    }
}

/// Hands out [`MockPeerConnection`]s and keeps them for inspection.
#[derive(Default)]
pub struct MockFactory {
    connections: Mutex<Vec<Arc<MockPeerConnection>>>,
    failures: Mutex<Vec<PcCall>>,
}

impl MockFactory {
    /// Most recent connection built for `remote`.
    pub fn connection(&self, remote: ParticipantId) -> Option<Arc<MockPeerConnection>> {
        self.connections
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|pc| pc.remote == remote)
            .cloned()
    }

    /// Scripts a failure into the next connection this factory builds.
    pub fn fail_next_connection(&self, call: PcCall) {
        self.failures.lock().unwrap().push(call);
    }

    pub fn created(&self) -> usize {
        self.connections.lock().unwrap().len()
    }
}

#[async_trait]
impl PeerConnectionFactory for MockFactory {
    async fn create(
        &self,
        remote: ParticipantId,
        ice_servers: &[IceServerConfig],
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerConnection>> {
        let pc = Arc::new(MockPeerConnection::new(
            remote,
            ice_servers.to_vec(),
            event_tx,
            std::mem::take(&mut *self.failures.lock().unwrap()),
        ));
        self.connections.lock().unwrap().push(Arc::clone(&pc));
        Ok(pc)
    }
}
