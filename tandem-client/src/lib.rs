mod config;
mod engine;
mod error;
mod media;
mod relay;
mod session;
mod transport;

pub use config::*;
pub use engine::*;
pub use error::*;
pub use media::*;
pub use relay::*;
pub use session::*;
pub use transport::*;
