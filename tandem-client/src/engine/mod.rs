mod engine;
mod engine_command;
mod engine_context;
mod engine_handle;
mod engine_record;
mod negotiation_state;

pub use engine::*;
pub use engine_command::*;
pub(crate) use engine_context::*;
pub use engine_handle::*;
pub use engine_record::*;
pub use negotiation_state::*;
