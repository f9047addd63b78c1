//! Command dispatch table.
//!
//! Card and sidebar commands starting with `:` are handled by the launcher
//! itself; everything else is a program to launch. Key bindings may also
//! name an action without the prefix.

use marquee_platform::SystemCommand;

/// Prefix marking an internal command.
pub const INTERNAL_PREFIX: char = ':';

/// Something the launcher does itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Select,
    Reload,
    Quit,
    Power(SystemCommand),
}

/// How a command string is handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    Internal(Action),
    /// Prefixed with `:` but not in the table.
    UnknownInternal(&'a str),
    /// A program to launch.
    External(&'a str),
}

/// Parse an action name such as `move_up` (no prefix, case-insensitive).
pub fn parse_action(name: &str) -> Option<Action> {
    match name.trim().to_lowercase().as_str() {
        "move_up" => Some(Action::MoveUp),
        "move_down" => Some(Action::MoveDown),
        "move_left" => Some(Action::MoveLeft),
        "move_right" => Some(Action::MoveRight),
        "select" => Some(Action::Select),
        "reload" => Some(Action::Reload),
        "quit" => Some(Action::Quit),
        "shutdown" => Some(Action::Power(SystemCommand::Shutdown)),
        "restart" => Some(Action::Power(SystemCommand::Restart)),
        "sleep" => Some(Action::Power(SystemCommand::Sleep)),
        _ => None,
    }
}

pub fn classify_command(command: &str) -> Command<'_> {
    let command = command.trim();
    match command.strip_prefix(INTERNAL_PREFIX) {
        Some(name) => match parse_action(name) {
            Some(action) => Command::Internal(action),
            None => Command::UnknownInternal(name),
        },
        None => Command::External(command),
    }
}

/// Classify a key binding value. A bare action name is internal, so
/// `select` and `:select` bind the same thing.
pub fn classify_binding(binding: &str) -> Command<'_> {
    match parse_action(binding) {
        Some(action) => Command::Internal(action),
        None => classify_command(binding),
    }
}
