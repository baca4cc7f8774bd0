//! Routing state machine.
//!
//! `RoutingController` owns the only [`RoutingState`] and is the single entry
//! point for start/stop/rotate. Each operation holds the state lock from the
//! validity check until the outcome is recorded, so concurrent callers are
//! serialized and the state only changes after a fully successful plan.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tokio::sync::watch;

use crate::config::RouterConfig;
use crate::error::AppError;

use super::applier::RuleApplier;
use super::log::LogSink;
use super::prober::check_dependencies;
use super::runner::CommandRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RoutingState {
    Disconnected,
    Connected,
}

impl fmt::Display for RoutingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingState::Disconnected => f.write_str("Disconnected"),
            RoutingState::Connected => f.write_str("Connected"),
        }
    }
}

pub struct RoutingController {
    required: Vec<String>,
    runner: Arc<dyn CommandRunner>,
    sink: Arc<dyn LogSink>,
    applier: RuleApplier,
    state: Mutex<RoutingState>,
    notifier: watch::Sender<RoutingState>,
}

impl RoutingController {
    pub fn new(config: RouterConfig, runner: Arc<dyn CommandRunner>, sink: Arc<dyn LogSink>) -> Self {
        let required = config.required_commands.clone();
        let applier = RuleApplier::new(config, Arc::clone(&runner), Arc::clone(&sink));
        let (notifier, _) = watch::channel(RoutingState::Disconnected);
        Self {
            required,
            runner,
            sink,
            applier,
            state: Mutex::new(RoutingState::Disconnected),
            notifier,
        }
    }

    pub fn state(&self) -> RoutingState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Receiver that observes every state change. Holds no lock on the controller.
    pub fn subscribe(&self) -> watch::Receiver<RoutingState> {
        self.notifier.subscribe()
    }

    /// Check dependencies, then apply the start plan. Disconnected only.
    pub fn start(&self) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.require(*state, RoutingState::Disconnected, "start routing")?;

        let result = check_dependencies(self.runner.as_ref(), self.sink.as_ref(), &self.required)
            .and_then(|()| self.applier.start_redirection());
        self.settle(&mut state, result, RoutingState::Connected)
    }

    /// Apply the stop plan. Connected only; a failure leaves the state Connected.
    pub fn stop(&self) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.require(*state, RoutingState::Connected, "stop routing")?;

        let result = self.applier.stop_redirection();
        self.settle(&mut state, result, RoutingState::Disconnected)
    }

    /// Signal the relay for a new identity. Connected only; never changes state.
    pub fn rotate_identity(&self) -> Result<(), AppError> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.require(*state, RoutingState::Connected, "request a new identity")?;

        match self.applier.rotate_identity() {
            Ok(()) => {
                self.sink.emit("New Tor identity requested successfully.");
                Ok(())
            }
            Err(e) => Err(self.report(e)),
        }
    }

    fn require(
        &self,
        current: RoutingState,
        expected: RoutingState,
        operation: &'static str,
    ) -> Result<(), AppError> {
        if current == expected {
            return Ok(());
        }
        Err(self.report(AppError::InvalidTransition {
            operation,
            state: current,
        }))
    }

    fn settle(
        &self,
        state: &mut RoutingState,
        result: Result<(), AppError>,
        target: RoutingState,
    ) -> Result<(), AppError> {
        match result {
            Ok(()) => {
                tracing::info!("Routing state {} -> {}", *state, target);
                *state = target;
                self.notifier.send_replace(target);
                Ok(())
            }
            Err(e) => Err(self.report(e)),
        }
    }

    fn report(&self, err: AppError) -> AppError {
        self.sink.emit(&format!("Error: {err}"));
        err
    }
}
