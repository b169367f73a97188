use std::fmt;
use tandem_core::{MediaKind, ProtocolError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to connect to relay: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("relay handshake failed: {0}")]
    Handshake(String),
    #[error("relay channel closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("no {0} source available")]
    Unavailable(MediaKind),
    #[error("media access denied: {0}")]
    Denied(String),
}

/// Asynchronous steps of a negotiation, named in failure logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationStep {
    DecodeSignal,
    CreatePeerConnection,
    AcquireMedia,
    AttachMedia,
    DetachMedia,
    CreateOffer,
    CreateAnswer,
    SetLocalDescription,
    SetRemoteDescription,
    Rollback,
    AddIceCandidate,
    SendSignal,
}

impl fmt::Display for NegotiationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DecodeSignal => "decode signal",
            Self::CreatePeerConnection => "create peer connection",
            Self::AcquireMedia => "acquire media",
            Self::AttachMedia => "attach media",
            Self::DetachMedia => "detach media",
            Self::CreateOffer => "create offer",
            Self::CreateAnswer => "create answer",
            Self::SetLocalDescription => "set local description",
            Self::SetRemoteDescription => "set remote description",
            Self::Rollback => "rollback",
            Self::AddIceCandidate => "add ice candidate",
            Self::SendSignal => "send signal",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("{step} failed: {source:#}")]
    Step {
        step: NegotiationStep,
        #[source]
        source: anyhow::Error,
    },
    #[error("acquire media failed: {0}")]
    Media(#[from] MediaError),
    #[error("send signal failed: {0}")]
    Relay(#[from] RelayError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl NegotiationError {
    pub fn step(&self) -> NegotiationStep {
        match self {
            Self::Step { step, .. } => *step,
            Self::Media(_) => NegotiationStep::AcquireMedia,
            Self::Relay(_) => NegotiationStep::SendSignal,
            Self::Protocol(_) => NegotiationStep::DecodeSignal,
        }
    }
}

/// Tags a peer connection failure with the step it happened in.
pub(crate) trait StepResultExt<T> {
    fn step(self, step: NegotiationStep) -> Result<T, NegotiationError>;
}

impl<T> StepResultExt<T> for anyhow::Result<T> {
    fn step(self, step: NegotiationStep) -> Result<T, NegotiationError> {
        self.map_err(|source| NegotiationError::Step { step, source })
    }
}
