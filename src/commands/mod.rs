//! Command handlers behind the shell, organized by functional domain.
//!
//! - `routing`: start, stop, new identity, status
//! - `logs`: log pane contents and export
//! - `logic`: pure functions (input parsing, status derivation, notices)
//! - `state`: shared `AppState` definition

pub(crate) mod logic;
pub(crate) mod logs;
pub(crate) mod routing;
mod state;

pub use logic::{RoutingStatus, ShellCommand};
pub use state::AppState;
