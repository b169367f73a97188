mod relay_event;
mod signaling_output;
mod ws_client;

pub use relay_event::*;
pub use signaling_output::*;
pub use ws_client::*;
