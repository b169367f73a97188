use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid participant id '{0}'")]
    InvalidParticipantId(String),

    #[error("signal of type '{expected}' expected, got '{actual}'")]
    UnexpectedKind { expected: String, actual: String },

    #[error("malformed {kind} payload: {source}")]
    MalformedPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}
