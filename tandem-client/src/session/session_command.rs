use crate::engine::EngineCommand;
use tandem_core::MediaConstraints;

/// Local media intents applied to every open session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Share(MediaConstraints),
    ToggleMedia,
    ToggleAudio,
    ToggleVideo,
}

impl From<SessionCommand> for EngineCommand {
    fn from(cmd: SessionCommand) -> Self {
        match cmd {
            SessionCommand::Share(constraints) => EngineCommand::Share(constraints),
            SessionCommand::ToggleMedia => EngineCommand::ToggleMedia,
            SessionCommand::ToggleAudio => EngineCommand::ToggleAudio,
            SessionCommand::ToggleVideo => EngineCommand::ToggleVideo,
        }
    }
}
