use crate::error::ProtocolError;
use crate::model::participant::ParticipantId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Negotiation message type. Unknown tags survive a round trip so the relay
/// can forward them untouched; engines drop them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
    Other(String),
}

impl From<String> for SignalKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "offer" => Self::Offer,
            "answer" => Self::Answer,
            "icecandidate" => Self::IceCandidate,
            _ => Self::Other(value),
        }
    }
}

impl From<SignalKind> for String {
    fn from(kind: SignalKind) -> Self {
        match kind {
            SignalKind::Offer => "offer".to_owned(),
            SignalKind::Answer => "answer".to_owned(),
            SignalKind::IceCandidate => "icecandidate".to_owned(),
            SignalKind::Other(other) => other,
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offer => f.write_str("offer"),
            Self::Answer => f.write_str("answer"),
            Self::IceCandidate => f.write_str("icecandidate"),
            Self::Other(other) => f.write_str(other),
        }
    }
}

/// Addressed negotiation message routed by the relay.
///
/// `from` is only meaningful on signals delivered by the relay; whatever a
/// client puts there is overwritten before forwarding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(rename = "type")]
    pub kind: SignalKind,
    pub to: ParticipantId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ParticipantId>,
    #[serde(default)]
    pub payload: Value,
}

impl Signal {
    pub fn new(kind: SignalKind, to: ParticipantId, payload: Value) -> Self {
        Self {
            kind,
            to,
            from: None,
            payload,
        }
    }

    pub fn offer(to: ParticipantId, offer: &SessionDescription) -> Self {
        Self::new(SignalKind::Offer, to, description_value(offer))
    }

    pub fn answer(to: ParticipantId, answer: &SessionDescription) -> Self {
        Self::new(SignalKind::Answer, to, description_value(answer))
    }

    pub fn ice_candidate(to: ParticipantId, candidate: &IceCandidate) -> Self {
        let payload = serde_json::to_value(candidate).unwrap_or(Value::Null);
        Self::new(SignalKind::IceCandidate, to, payload)
    }

    /// Returns the signal with `from` overwritten by the relay-known sender.
    pub fn stamped(mut self, from: ParticipantId) -> Self {
        self.from = Some(from);
        self
    }

    pub fn description(&self) -> Result<SessionDescription, ProtocolError> {
        match self.kind {
            SignalKind::Offer | SignalKind::Answer => self.decode_payload(),
            _ => Err(ProtocolError::UnexpectedKind {
                expected: "offer|answer".to_owned(),
                actual: self.kind.to_string(),
            }),
        }
    }

    pub fn candidate(&self) -> Result<IceCandidate, ProtocolError> {
        match self.kind {
            SignalKind::IceCandidate => self.decode_payload(),
            _ => Err(ProtocolError::UnexpectedKind {
                expected: "icecandidate".to_owned(),
                actual: self.kind.to_string(),
            }),
        }
    }

    fn decode_payload<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        serde_json::from_value(self.payload.clone()).map_err(|source| {
            ProtocolError::MalformedPayload {
                kind: self.kind.to_string(),
                source,
            }
        })
    }
}

fn description_value(desc: &SessionDescription) -> Value {
    serde_json::to_value(desc).unwrap_or(Value::Null)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
}

/// Offer or answer body, passed between peer connections verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

/// Trickled connectivity candidate in the browser JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default, rename = "sdpMLineIndex")]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default)]
    pub username_fragment: Option<String>,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_m_line_index: None,
            username_fragment: None,
        }
    }
}
