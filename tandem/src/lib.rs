pub use tandem_core::ParticipantId;

pub mod model {
    pub use tandem_core::model::*;
    pub use tandem_core::utils::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use tandem_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use tandem_client::*;
}
