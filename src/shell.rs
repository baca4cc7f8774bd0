//! Interactive line-oriented shell: the presentation layer.
//!
//! Reads one command per line, dispatches it to the command handlers, prints
//! confirmations and failure notices, and re-renders the status line whenever
//! the controller reports a state change.

use std::io::{BufRead, Write};

use tokio::sync::watch;

use crate::commands::logic::{failure_notice, parse_command, status_for, HELP_TEXT};
use crate::commands::{logs, routing, AppState, ShellCommand};
use crate::core::RoutingState;
use crate::error::AppError;

pub struct Shell<'a, W: Write> {
    state: &'a AppState,
    out: W,
    json: bool,
    updates: watch::Receiver<RoutingState>,
}

impl<'a, W: Write> Shell<'a, W> {
    pub fn new(state: &'a AppState, out: W, json: bool) -> Self {
        let updates = state.controller.subscribe();
        Self {
            state,
            out,
            json,
            updates,
        }
    }

    /// Run until `quit` or end of input.
    ///
    /// Input is read as raw lines; bytes that are not UTF-8 are replaced and
    /// end up reported as an unknown command. A read error ends the session
    /// like end of input does.
    pub fn run<R: BufRead>(&mut self, mut input: R) -> Result<(), AppError> {
        self.print_status()?;
        self.prompt()?;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match input.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("Failed to read shell input: {e}");
                    self.print_error(&AppError::from(e), None)?;
                    break;
                }
            }
            let line = String::from_utf8_lossy(&buf);
            let command = match parse_command(&line) {
                Ok(Some(command)) => command,
                Ok(None) => {
                    self.prompt()?;
                    continue;
                }
                Err(e) => {
                    self.print_error(&e, None)?;
                    self.prompt()?;
                    continue;
                }
            };
            if command == ShellCommand::Quit {
                break;
            }
            self.dispatch(command)?;
            self.refresh()?;
            self.prompt()?;
        }
        if self.state.controller.state() == RoutingState::Connected {
            tracing::warn!("Leaving the shell while Tor routing is still active");
            self.print_line("warning", "Warning: Tor routing is still active.")?;
        }
        Ok(())
    }

    fn dispatch(&mut self, command: ShellCommand) -> Result<(), AppError> {
        let outcome = match command {
            ShellCommand::Start => routing::start_routing(self.state).map(|_| None),
            ShellCommand::Stop => routing::stop_routing(self.state).map(|_| None),
            ShellCommand::NewIdentity => routing::new_identity(self.state)
                .map(|()| Some("New Tor identity requested successfully.".to_string())),
            ShellCommand::Export => logs::export_logs(self.state).map(Some),
            ShellCommand::Logs => {
                self.print_logs(logs::get_logs(self.state))?;
                Ok(None)
            }
            ShellCommand::Status => {
                self.print_status()?;
                Ok(None)
            }
            ShellCommand::Help => Ok(Some(HELP_TEXT.to_string())),
            ShellCommand::Quit => Ok(None),
        };

        match outcome {
            Ok(Some(message)) => self.print_line("message", &message),
            Ok(None) => Ok(()),
            Err(e) => self.print_error(&e, Some(command)),
        }
    }

    /// One line of output: plain text, or `{"<key>": text}` in JSON mode.
    fn print_line(&mut self, key: &str, text: &str) -> Result<(), AppError> {
        if self.json {
            self.print_json(&serde_json::json!({ key: text }))
        } else {
            writeln!(self.out, "{text}")?;
            Ok(())
        }
    }

    fn print_logs(&mut self, lines: Vec<String>) -> Result<(), AppError> {
        if self.json {
            return self.print_json(&serde_json::json!({ "logs": lines }));
        }
        for line in lines {
            writeln!(self.out, "{line}")?;
        }
        Ok(())
    }

    /// Errors from a command get its failure notice; input errors print bare.
    fn print_error(&mut self, err: &AppError, command: Option<ShellCommand>) -> Result<(), AppError> {
        if self.json {
            return self.print_json(err);
        }
        match command {
            Some(command) => writeln!(self.out, "Error: {}", failure_notice(command, err))?,
            None => writeln!(self.out, "{err}")?,
        }
        Ok(())
    }

    fn print_json<T: serde::Serialize + ?Sized>(&mut self, value: &T) -> Result<(), AppError> {
        let json = serde_json::to_string(value).map_err(|e| AppError::Io(e.to_string()))?;
        writeln!(self.out, "{json}")?;
        Ok(())
    }

    /// Print the status line if the controller changed state since the last render.
    fn refresh(&mut self) -> Result<(), AppError> {
        if self.updates.has_changed().unwrap_or(false) {
            self.print_status()?;
        }
        Ok(())
    }

    fn print_status(&mut self) -> Result<(), AppError> {
        let status = status_for(*self.updates.borrow_and_update());
        if self.json {
            return self.print_json(&status);
        }
        writeln!(self.out, "{}", status.label)?;
        Ok(())
    }

    fn prompt(&mut self) -> Result<(), AppError> {
        if !self.json {
            write!(self.out, "> ")?;
            self.out.flush()?;
        }
        Ok(())
    }
}
