//! Packet-filter rules and resolver contents as plain values.
//!
//! Nothing here touches the host. The applier turns these values into
//! invocations on a [`CommandRunner`](super::runner::CommandRunner).

use std::fmt;

use crate::config::RouterConfig;

/// One external command, without the privilege prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl HostCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Full argv: `prefix` followed by the program and its arguments.
    pub fn argv(&self, prefix: &[String]) -> Vec<String> {
        prefix
            .iter()
            .cloned()
            .chain(std::iter::once(self.program.clone()))
            .chain(self.args.iter().cloned())
            .collect()
    }
}

impl fmt::Display for HostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// iptables rules that send everything except the relay's own traffic through
/// the relay's transparent port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectionRuleSet {
    pub filter_tool: String,
    pub relay_user: String,
    pub trans_port: u16,
}

impl RedirectionRuleSet {
    pub fn from_config(config: &RouterConfig) -> Self {
        Self {
            filter_tool: config.filter_tool.clone(),
            relay_user: config.relay_user.clone(),
            trans_port: config.trans_port,
        }
    }

    pub fn flush_filter(&self) -> HostCommand {
        HostCommand::new(&self.filter_tool, ["-F"])
    }

    pub fn flush_nat(&self) -> HostCommand {
        HostCommand::new(&self.filter_tool, ["-t", "nat", "-F"])
    }

    /// NAT rule redirecting TCP not owned by the relay user. Excluding the
    /// relay's own traffic here is what prevents a routing loop.
    pub fn redirect_rule(&self) -> HostCommand {
        let port = self.trans_port.to_string();
        HostCommand::new(
            &self.filter_tool,
            [
                "-t",
                "nat",
                "-A",
                "OUTPUT",
                "-p",
                "tcp",
                "-m",
                "owner",
                "!",
                "--uid-owner",
                self.relay_user.as_str(),
                "-j",
                "REDIRECT",
                "--to-ports",
                port.as_str(),
            ],
        )
    }

    /// Filter rule letting the relay's own traffic leave unredirected.
    pub fn accept_rule(&self) -> HostCommand {
        HostCommand::new(
            &self.filter_tool,
            [
                "-A",
                "OUTPUT",
                "-m",
                "owner",
                "--uid-owner",
                self.relay_user.as_str(),
                "-j",
                "ACCEPT",
            ],
        )
    }
}

/// Complete contents of the resolver file: a single `nameserver` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub nameserver: String,
}

impl ResolverConfig {
    pub fn loopback(config: &RouterConfig) -> Self {
        Self {
            nameserver: config.loopback_nameserver.clone(),
        }
    }

    pub fn public(config: &RouterConfig) -> Self {
        Self {
            nameserver: config.public_nameserver.clone(),
        }
    }

    pub fn contents(&self) -> String {
        format!("nameserver {}\n", self.nameserver)
    }
}
