//! Unified error type for every routing operation.
//!
//! `AppError` is the single error type returned by the prober, the applier,
//! the controller and the shell command handlers. It serializes as
//! `{ "kind": "...", "message": "..." }` so machine-readable output can
//! distinguish error categories without parsing text.

use std::path::PathBuf;

use serde::ser::SerializeStruct;

use crate::core::RoutingState;

/// Application-level error.
///
/// None of the variants is fatal: the controller stays usable after any of them.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A required executable is not on `PATH`.
    #[error("{command} is not installed. Please install it first.")]
    MissingDependency { command: String },

    /// An external command exited unsuccessfully, could not be spawned, or timed out.
    #[error("command `{command}` failed: {exit_info}")]
    SystemCommandFailed { command: String, exit_info: String },

    /// Overwriting a file (the resolver config) failed.
    #[error("failed to write {}: {cause}", path.display())]
    FileWriteFailed { path: PathBuf, cause: String },

    /// The operation is not allowed in the current routing state.
    #[error("cannot {operation} while {state}")]
    InvalidTransition {
        operation: &'static str,
        state: RoutingState,
    },

    /// I/O outside the privileged boundary (shell input, log export).
    #[error("{0}")]
    Io(String),

    /// Invalid or missing user input.
    #[error("{0}")]
    InvalidInput(String),
}

impl AppError {
    /// Returns the error kind as a string matching the variant name.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::MissingDependency { .. } => "MissingDependency",
            AppError::SystemCommandFailed { .. } => "SystemCommandFailed",
            AppError::FileWriteFailed { .. } => "FileWriteFailed",
            AppError::InvalidTransition { .. } => "InvalidTransition",
            AppError::Io(_) => "Io",
            AppError::InvalidInput(_) => "InvalidInput",
        }
    }
}

/// Custom Serialize: produces `{ "kind": "Variant", "message": "..." }`.
impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut s = serializer.serialize_struct("AppError", 2)?;
        s.serialize_field("kind", self.kind())?;
        s.serialize_field("message", &self.to_string())?;
        s.end()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}
