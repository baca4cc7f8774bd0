//! Ordered host changes that switch Tor routing on and off.
//!
//! A transition is a plan: a list of [`Step`]s, each one intent log line plus
//! one external action. Plans run fail-fast. The first failing step ends the
//! plan and its error is returned as-is; steps already applied stay applied
//! unless `revert_on_failure` is set, in which case a failed start is followed
//! by a best-effort undo of whatever the attempted steps touched.

use std::sync::Arc;

use crate::config::RouterConfig;
use crate::error::AppError;

use super::log::LogSink;
use super::rules::{HostCommand, RedirectionRuleSet, ResolverConfig};
use super::runner::CommandRunner;

// 1-based positions in the start plan.
const SERVICE_STEP: usize = 1;
const FIRST_RULE_STEP: usize = 2;
const RESOLVER_STEP: usize = 6;

/// What a step does to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Command(HostCommand),
    WriteResolver(ResolverConfig),
}

/// One privileged step of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Logged before the action runs.
    pub intent: String,
    pub action: Action,
}

impl Step {
    fn command(intent: impl Into<String>, command: HostCommand) -> Self {
        Self {
            intent: intent.into(),
            action: Action::Command(command),
        }
    }
}

pub struct RuleApplier {
    config: RouterConfig,
    rules: RedirectionRuleSet,
    runner: Arc<dyn CommandRunner>,
    sink: Arc<dyn LogSink>,
}

impl RuleApplier {
    pub fn new(config: RouterConfig, runner: Arc<dyn CommandRunner>, sink: Arc<dyn LogSink>) -> Self {
        let rules = RedirectionRuleSet::from_config(&config);
        Self {
            config,
            rules,
            runner,
            sink,
        }
    }

    /// Service start, both flushes, redirect-then-accept, loopback resolver.
    pub fn start_plan(&self) -> Vec<Step> {
        let resolver = ResolverConfig::loopback(&self.config);
        vec![
            Step::command("Starting Tor service...", self.systemctl("start")),
            Step::command("Flushing iptables filter rules...", self.rules.flush_filter()),
            Step::command("Flushing iptables nat rules...", self.rules.flush_nat()),
            Step::command(
                format!(
                    "Redirecting traffic not owned by {} to port {}...",
                    self.rules.relay_user, self.rules.trans_port
                ),
                self.rules.redirect_rule(),
            ),
            Step::command(
                format!("Accepting traffic owned by {}...", self.rules.relay_user),
                self.rules.accept_rule(),
            ),
            Step {
                intent: format!("Updating DNS settings (nameserver {})...", resolver.nameserver),
                action: Action::WriteResolver(resolver),
            },
        ]
    }

    /// Service stop, both flushes, public resolver.
    pub fn stop_plan(&self) -> Vec<Step> {
        let mut plan = vec![self.stop_service_step()];
        plan.extend(self.flush_steps());
        plan.push(self.restore_resolver_step());
        plan
    }

    /// Undo steps for a start plan that failed after `completed` steps
    /// succeeded. Only what the attempted prefix may have touched is reverted.
    pub fn revert_plan(&self, completed: usize) -> Vec<Step> {
        let attempted = completed + 1;
        let mut plan = Vec::new();
        if completed >= SERVICE_STEP {
            plan.push(self.stop_service_step());
        }
        if attempted >= FIRST_RULE_STEP {
            plan.extend(self.flush_steps());
        }
        if attempted >= RESOLVER_STEP {
            plan.push(self.restore_resolver_step());
        }
        plan
    }

    pub fn start_redirection(&self) -> Result<(), AppError> {
        self.execute(&self.start_plan()).map_err(|(completed, err)| {
            if self.config.revert_on_failure {
                self.revert(completed);
            }
            err
        })
    }

    pub fn stop_redirection(&self) -> Result<(), AppError> {
        self.execute(&self.stop_plan()).map_err(|(_, err)| err)
    }

    /// Ask the relay for new circuits with SIGHUP. Filter rules are untouched.
    pub fn rotate_identity(&self) -> Result<(), AppError> {
        let process = &self.config.relay_process;
        self.sink.emit(&format!("Sending HUP to {process}..."));
        self.runner
            .run(&HostCommand::new("killall", ["-HUP", process.as_str()]))
    }

    fn systemctl(&self, verb: &str) -> HostCommand {
        HostCommand::new("systemctl", [verb, self.config.relay_service.as_str()])
    }

    fn stop_service_step(&self) -> Step {
        Step::command("Stopping Tor service...", self.systemctl("stop"))
    }

    fn flush_steps(&self) -> [Step; 2] {
        [
            Step::command("Flushing iptables filter rules...", self.rules.flush_filter()),
            Step::command("Flushing iptables nat rules...", self.rules.flush_nat()),
        ]
    }

    fn restore_resolver_step(&self) -> Step {
        let resolver = ResolverConfig::public(&self.config);
        Step {
            intent: format!("Restoring DNS settings (nameserver {})...", resolver.nameserver),
            action: Action::WriteResolver(resolver),
        }
    }

    /// Runs `plan` until the first failure, which comes back with the number
    /// of steps that had completed before it.
    fn execute(&self, plan: &[Step]) -> Result<(), (usize, AppError)> {
        for (completed, step) in plan.iter().enumerate() {
            self.sink.emit(&step.intent);
            self.perform(&step.action).map_err(|e| (completed, e))?;
        }
        Ok(())
    }

    fn perform(&self, action: &Action) -> Result<(), AppError> {
        match action {
            Action::Command(command) => self.runner.run(command),
            Action::WriteResolver(resolver) => self
                .runner
                .overwrite(&self.config.resolv_conf_path, &resolver.contents()),
        }
    }

    fn revert(&self, completed: usize) {
        let plan = self.revert_plan(completed);
        if plan.is_empty() {
            tracing::info!("Nothing to revert: the failed step was the first");
            return;
        }
        self.sink.emit("Reverting partially applied routing...");
        for step in plan {
            self.sink.emit(&step.intent);
            if let Err(e) = self.perform(&step.action) {
                tracing::warn!("Revert step failed: {e}");
                self.sink.emit(&format!("Revert step failed: {e}"));
            }
        }
    }
}
