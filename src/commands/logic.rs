//! Pure presentation logic extracted from the command handlers.
//!
//! These functions take plain parameters (no controller, no I/O) and can be
//! unit-tested without touching the host.

use serde::Serialize;

use crate::core::RoutingState;
use crate::error::AppError;

/// A line of shell input, parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCommand {
    Start,
    Stop,
    NewIdentity,
    Status,
    Logs,
    Export,
    Help,
    Quit,
}

impl ShellCommand {
    /// Verb used in failure notices ("Failed to <verb>: ...").
    pub fn verb(self) -> &'static str {
        match self {
            ShellCommand::Start => "start Tor routing",
            ShellCommand::Stop => "stop Tor routing",
            ShellCommand::NewIdentity => "request new Tor identity",
            ShellCommand::Export => "export logs",
            ShellCommand::Status => "read status",
            ShellCommand::Logs => "read logs",
            ShellCommand::Help | ShellCommand::Quit => "run command",
        }
    }
}

pub const HELP_TEXT: &str = "\
Commands:
  start      route all traffic through Tor
  stop       restore direct routing
  identity   request a new Tor identity
  status     show routing status
  logs       print the log
  export     write the log to a file
  help       show this message
  quit       leave the shell";

/// Parse one line of input. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<ShellCommand>, AppError> {
    let word = line.trim().to_ascii_lowercase();
    let command = match word.as_str() {
        "" => return Ok(None),
        "start" | "connect" => ShellCommand::Start,
        "stop" | "disconnect" => ShellCommand::Stop,
        "identity" | "new-identity" | "newnym" => ShellCommand::NewIdentity,
        "status" => ShellCommand::Status,
        "logs" | "log" => ShellCommand::Logs,
        "export" => ShellCommand::Export,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => {
            return Err(AppError::InvalidInput(format!(
                "unknown command `{other}` (try `help`)"
            )))
        }
    };
    Ok(Some(command))
}

/// Status line plus which actions are currently enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingStatus {
    pub state: RoutingState,
    pub label: String,
    pub can_start: bool,
    pub can_stop: bool,
    pub can_rotate: bool,
}

pub fn status_for(state: RoutingState) -> RoutingStatus {
    let connected = state == RoutingState::Connected;
    RoutingStatus {
        state,
        label: format!("Status: {state}"),
        can_start: !connected,
        can_stop: connected,
        can_rotate: connected,
    }
}

/// Blocking notification shown to the user for a failed command.
pub fn failure_notice(command: ShellCommand, err: &AppError) -> String {
    format!("Failed to {}: {err}", command.verb())
}
