use std::path::Path;
use std::sync::Mutex;

use tor_router_lib::core::{CommandRunner, HostCommand};
use tor_router_lib::error::AppError;

/// Runner that records every host action and fails the ones it is told to.
#[derive(Default)]
pub struct ScriptedRunner {
    pub missing: Vec<String>,
    /// Substring of a command (or resolver content) that should fail.
    pub fail_matching: Mutex<Option<String>>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_when(&self, needle: &str) {
        *self.fail_matching.lock().unwrap() = Some(needle.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> bool {
        let fails = self
            .fail_matching
            .lock()
            .unwrap()
            .as_deref()
            .is_some_and(|needle| call.contains(needle));
        self.calls.lock().unwrap().push(call);
        fails
    }
}

impl CommandRunner for ScriptedRunner {
    fn locate(&self, program: &str) -> bool {
        !self.missing.iter().any(|m| m == program)
    }

    fn run(&self, command: &HostCommand) -> Result<(), AppError> {
        let shown = command.to_string();
        if self.record(shown.clone()) {
            return Err(AppError::SystemCommandFailed {
                command: shown,
                exit_info: "exit status: 1".into(),
            });
        }
        Ok(())
    }

    fn overwrite(&self, path: &Path, contents: &str) -> Result<(), AppError> {
        if self.record(format!("write {} {}", path.display(), contents.trim_end())) {
            return Err(AppError::FileWriteFailed {
                path: path.to_path_buf(),
                cause: "Read-only file system (os error 30)".into(),
            });
        }
        Ok(())
    }
}
