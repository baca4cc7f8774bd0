//! The privileged-command boundary.
//!
//! Everything that looks at or mutates the host goes through [`CommandRunner`]:
//! - [`SystemRunner`]: the real host, with `which` lookups, `sudo`-prefixed
//!   commands with a per-invocation timeout, resolver writes through `tee`
//! - [`DryRunRunner`]: records and logs what would happen, touches nothing

use std::path::Path;
use std::process::Stdio;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::io::AsyncWriteExt;

use crate::config::RouterConfig;
use crate::error::AppError;

use super::rules::HostCommand;

/// Host operations used by the prober and the applier.
pub trait CommandRunner: Send + Sync {
    /// Whether `program` resolves through the executable search path.
    fn locate(&self, program: &str) -> bool;

    /// Run one command with elevated privilege; success means exit status 0.
    fn run(&self, command: &HostCommand) -> Result<(), AppError>;

    /// Replace the whole content of `path`.
    fn overwrite(&self, path: &Path, contents: &str) -> Result<(), AppError>;
}

/// Runner that executes against the real host.
///
/// Commands are spawned through a private current-thread tokio runtime so each
/// one can be bounded by a timeout while the public API stays blocking. A
/// command that outlives its timeout is killed. The resolver is written with
/// `tee` behind the privilege prefix, so the calling process itself needs no
/// write access to it.
///
/// The methods block the calling thread and must not be called from inside an
/// async task. If they are, they return an error instead of nesting runtimes.
pub struct SystemRunner {
    runtime: tokio::runtime::Runtime,
    privilege_prefix: Vec<String>,
    timeout: Duration,
}

impl SystemRunner {
    pub fn new(config: &RouterConfig) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .enable_time()
            .build()?;
        Ok(Self {
            runtime,
            privilege_prefix: config.privilege_prefix.clone(),
            timeout: config.command_timeout(),
        })
    }

    /// Spawn `argv`, feed it `input` on stdin, and wait for a zero exit.
    /// Failures come back as the exit info shown to the user.
    fn invoke(&self, argv: &[String], input: Option<&[u8]>) -> Result<(), String> {
        let Some((program, args)) = argv.split_first() else {
            return Err("empty command line".into());
        };
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err("cannot run blocking host commands from inside an async runtime".into());
        }

        let shown = argv.join(" ");
        tracing::debug!("Running `{shown}`");
        let timeout = self.timeout;
        let outcome = self.runtime.block_on(async {
            tokio::time::timeout(timeout, async {
                let mut child = tokio::process::Command::new(program)
                    .args(args)
                    .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
                    .stdout(Stdio::null())
                    .stderr(Stdio::piped())
                    .kill_on_drop(true)
                    .spawn()
                    .map_err(|e| format!("failed to spawn: {e}"))?;
                if let (Some(bytes), Some(mut stdin)) = (input, child.stdin.take()) {
                    stdin
                        .write_all(bytes)
                        .await
                        .map_err(|e| format!("failed to write stdin: {e}"))?;
                }
                child
                    .wait_with_output()
                    .await
                    .map_err(|e| format!("failed to wait: {e}"))
            })
            .await
        });

        let output = match outcome {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!("`{shown}` killed after {}s", timeout.as_secs());
                return Err(format!("timed out after {}s", timeout.as_secs()));
            }
        };

        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if stderr.is_empty() {
            Err(output.status.to_string())
        } else {
            Err(format!("{}: {stderr}", output.status))
        }
    }
}

impl CommandRunner for SystemRunner {
    fn locate(&self, program: &str) -> bool {
        match which::which(program) {
            Ok(path) => {
                tracing::debug!("Found {program} at {}", path.display());
                true
            }
            Err(e) => {
                tracing::debug!("Lookup of {program} failed: {e}");
                false
            }
        }
    }

    fn run(&self, command: &HostCommand) -> Result<(), AppError> {
        let argv = command.argv(&self.privilege_prefix);
        self.invoke(&argv, None)
            .map_err(|exit_info| AppError::SystemCommandFailed {
                command: argv.join(" "),
                exit_info,
            })
    }

    fn overwrite(&self, path: &Path, contents: &str) -> Result<(), AppError> {
        let failed = |cause: String| AppError::FileWriteFailed {
            path: path.to_path_buf(),
            cause,
        };
        if self.privilege_prefix.is_empty() {
            return std::fs::write(path, contents).map_err(|e| failed(e.to_string()));
        }
        let tee = HostCommand::new("tee", [path.display().to_string()]);
        self.invoke(&tee.argv(&self.privilege_prefix), Some(contents.as_bytes()))
            .map_err(failed)
    }
}

/// Runner that performs nothing and reports every action as successful.
#[derive(Debug, Default)]
pub struct DryRunRunner {
    privilege_prefix: Vec<String>,
    actions: Mutex<Vec<String>>,
}

impl DryRunRunner {
    pub fn new(config: &RouterConfig) -> Self {
        Self {
            privilege_prefix: config.privilege_prefix.clone(),
            actions: Mutex::new(Vec::new()),
        }
    }

    /// Actions that would have run, in order.
    pub fn actions(&self) -> Vec<String> {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, action: String) {
        tracing::info!("[dry-run] {action}");
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(action);
    }
}

impl CommandRunner for DryRunRunner {
    fn locate(&self, _program: &str) -> bool {
        true
    }

    fn run(&self, command: &HostCommand) -> Result<(), AppError> {
        self.record(command.argv(&self.privilege_prefix).join(" "));
        Ok(())
    }

    fn overwrite(&self, path: &Path, contents: &str) -> Result<(), AppError> {
        self.record(format!("write {} <- {:?}", path.display(), contents));
        Ok(())
    }
}

/// Scripted runner shared by the unit tests of the core modules.
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashSet;
    use std::path::Path;
    use std::sync::Mutex;

    use super::CommandRunner;
    use crate::core::rules::HostCommand;
    use crate::error::AppError;

    /// Records every invocation; `fail_on` makes the n-th (1-based) mutating
    /// call fail.
    #[derive(Default)]
    pub struct FakeRunner {
        pub missing: HashSet<String>,
        pub fail_on: Mutex<Option<usize>>,
        pub lookups: Mutex<Vec<String>>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_missing(programs: &[&str]) -> Self {
            Self {
                missing: programs.iter().map(|p| p.to_string()).collect(),
                ..Self::default()
            }
        }

        pub fn failing_on(n: usize) -> Self {
            let runner = Self::default();
            *runner.fail_on.lock().unwrap() = Some(n);
            runner
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn lookups(&self) -> Vec<String> {
            self.lookups.lock().unwrap().clone()
        }

        fn record(&self, call: String) -> bool {
            let mut calls = self.calls.lock().unwrap();
            calls.push(call);
            *self.fail_on.lock().unwrap() == Some(calls.len())
        }
    }

    impl CommandRunner for FakeRunner {
        fn locate(&self, program: &str) -> bool {
            self.lookups.lock().unwrap().push(program.to_string());
            !self.missing.contains(program)
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
                    cause: "Permission denied (os error 13)".into(),
                });
            }
            Ok(())
        }
    }
}
