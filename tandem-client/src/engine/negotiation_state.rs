use std::fmt;

/// Observable negotiation state of one engine record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NegotiationState {
    #[default]
    Idle,
    /// A local offer is waiting for its answer.
    Negotiating,
    /// Descriptions are exchanged, ICE has not connected yet.
    Converging,
    Connected,
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Negotiating => f.write_str("negotiating"),
            Self::Converging => f.write_str("converging"),
            Self::Connected => f.write_str("connected"),
        }
    }
}
