//! Core routing logic: dependency check, rule application, state machine.
//!
//! - [`RoutingController`] / [`RoutingState`]: the state machine callers talk to
//! - [`RuleApplier`]: ordered start/stop plans and identity rotation
//! - [`check_dependencies`]: first-fail executable lookup
//! - [`CommandRunner`]: the injectable privileged-command boundary
//! - [`LogSink`] / [`LogBuffer`]: user-facing log lines

pub mod applier;
pub mod controller;
pub mod log;
pub mod prober;
pub mod rules;
pub mod runner;

pub use applier::RuleApplier;
pub use controller::{RoutingController, RoutingState};
pub use log::{LogBuffer, LogSink};
pub use prober::check_dependencies;
pub use rules::{HostCommand, RedirectionRuleSet, ResolverConfig};
pub use runner::{CommandRunner, DryRunRunner, SystemRunner};
