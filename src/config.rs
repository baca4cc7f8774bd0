//! Centralized runtime constants and the overridable router configuration.
//!
//! The constants describe the single supported host layout (systemd-managed
//! Tor, iptables, `/etc/resolv.conf`). `RouterConfig` carries the same values as
//! fields so a JSON file or CLI flags can override them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// systemd unit name of the relay service.
pub const RELAY_SERVICE: &str = "tor";

/// Process name targeted by the identity-rotation signal.
pub const RELAY_PROCESS: &str = "tor";

/// Runtime user the relay daemon runs as. Its traffic is never redirected.
pub const RELAY_USER: &str = "debian-tor";

/// Port of the relay's `TransPort` listener.
pub const TRANS_PORT: u16 = 9040;

/// Resolver file that is fully overwritten on every transition.
pub const RESOLV_CONF_PATH: &str = "/etc/resolv.conf";

/// Nameserver written while routing is active (the relay's `DNSPort` on loopback).
pub const LOOPBACK_NAMESERVER: &str = "127.0.0.1";

/// Nameserver written when routing is stopped.
pub const PUBLIC_NAMESERVER: &str = "8.8.8.8";

/// Packet-filter management tool.
pub const FILTER_TOOL: &str = "iptables";

/// Executables that must be on `PATH` before routing can start, in check order.
pub const REQUIRED_COMMANDS: [&str; 2] = ["tor", FILTER_TOOL];

/// Command prepended to every host-mutating invocation.
pub const PRIVILEGE_PREFIX: &str = "sudo";

/// Upper bound for a single external command (seconds).
pub const COMMAND_TIMEOUT_SECS: u64 = 30;

/// File the accumulated log is exported to, relative to the working directory.
pub const LOG_EXPORT_FILE: &str = "tor_router_logs.txt";

/// Router configuration.
///
/// Every field defaults to the matching constant above, so a config file only
/// needs to list what differs on the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub relay_service: String,
    pub relay_process: String,
    pub relay_user: String,
    pub trans_port: u16,
    pub resolv_conf_path: PathBuf,
    pub loopback_nameserver: String,
    pub public_nameserver: String,
    pub filter_tool: String,
    pub required_commands: Vec<String>,
    /// Empty means commands run without elevation.
    pub privilege_prefix: Vec<String>,
    pub command_timeout_secs: u64,
    /// Run the stop sequence when a start sequence fails halfway.
    pub revert_on_failure: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            relay_service: RELAY_SERVICE.to_string(),
            relay_process: RELAY_PROCESS.to_string(),
            relay_user: RELAY_USER.to_string(),
            trans_port: TRANS_PORT,
            resolv_conf_path: PathBuf::from(RESOLV_CONF_PATH),
            loopback_nameserver: LOOPBACK_NAMESERVER.to_string(),
            public_nameserver: PUBLIC_NAMESERVER.to_string(),
            filter_tool: FILTER_TOOL.to_string(),
            required_commands: REQUIRED_COMMANDS.iter().map(|c| c.to_string()).collect(),
            privilege_prefix: vec![PRIVILEGE_PREFIX.to_string()],
            command_timeout_secs: COMMAND_TIMEOUT_SECS,
            revert_on_failure: false,
        }
    }
}

impl RouterConfig {
    /// Load a JSON config file. Missing fields fall back to defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.trans_port == 0 {
            anyhow::bail!("trans_port must be non-zero");
        }
        if self.command_timeout_secs == 0 {
            anyhow::bail!("command_timeout_secs must be non-zero");
        }
        if self.relay_user.trim().is_empty() {
            anyhow::bail!("relay_user must not be empty");
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_matches_constants() {
        let config = RouterConfig::default();
        assert_eq!(config.trans_port, 9040);
        assert_eq!(config.relay_user, "debian-tor");
        assert_eq!(config.resolv_conf_path, PathBuf::from("/etc/resolv.conf"));
        assert_eq!(config.required_commands, vec!["tor", "iptables"]);
        assert_eq!(config.privilege_prefix, vec!["sudo"]);
        assert!(!config.revert_on_failure);
    }

    #[test]
    fn test_all_constants_sane() {
        const _: () = assert!(TRANS_PORT > 0);
        const _: () = assert!(COMMAND_TIMEOUT_SECS > 0);
        assert!(REQUIRED_COMMANDS.contains(&FILTER_TOOL));
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "trans_port": 9050, "privilege_prefix": [] }}"#).unwrap();

        let config = RouterConfig::load(file.path()).unwrap();
        assert_eq!(config.trans_port, 9050);
        assert!(config.privilege_prefix.is_empty());
        assert_eq!(config.relay_user, RELAY_USER);
        assert_eq!(config.public_nameserver, PUBLIC_NAMESERVER);
    }

    #[test]
    fn test_load_rejects_zero_port() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "trans_port": 0 }}"#).unwrap();

        let err = RouterConfig::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("trans_port"));
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = RouterConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid config file"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = RouterConfig::load(Path::new("/nonexistent/tor-router.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[test]
    fn test_command_timeout_duration() {
        let config = RouterConfig {
            command_timeout_secs: 5,
            ..RouterConfig::default()
        };
        assert_eq!(config.command_timeout(), Duration::from_secs(5));
    }
}
