mod session_command;
mod session_event;
mod session_manager;

pub use session_command::*;
pub use session_event::*;
pub use session_manager::*;
