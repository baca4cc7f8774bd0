//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use crate::config::RouterConfig;

/// Tor Traffic Router
///
/// Toggle all outbound traffic between direct and transparent Tor routing.
/// Starts an interactive shell; type `help` for commands.
#[derive(Parser, Debug)]
#[command(name = "tor-router")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// JSON config file overriding the built-in defaults
    #[arg(short, long, env = "TOR_ROUTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log every host change instead of performing it
    #[arg(long)]
    pub dry_run: bool,

    /// Run the stop sequence when starting fails halfway
    #[arg(long)]
    pub revert_on_failure: bool,

    /// Timeout for each external command, in seconds
    #[arg(long, value_name = "SECS")]
    pub command_timeout: Option<u64>,

    /// Where `export` writes the log
    #[arg(long, default_value = crate::config::LOG_EXPORT_FILE)]
    pub export_path: PathBuf,

    /// Print status and errors as JSON objects
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Load the config file (if any) and apply flag overrides on top.
    pub fn router_config(&self) -> anyhow::Result<RouterConfig> {
        let mut config = match &self.config {
            Some(path) => RouterConfig::load(path)?,
            None => RouterConfig::default(),
        };
        if self.revert_on_failure {
            config.revert_on_failure = true;
        }
        if let Some(secs) = self.command_timeout {
            config.command_timeout_secs = secs;
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["tor-router"]).unwrap();
        assert!(!cli.dry_run);
        assert_eq!(cli.export_path, PathBuf::from("tor_router_logs.txt"));
        assert_eq!(cli.router_config().unwrap(), RouterConfig::default());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "tor-router",
            "--revert-on-failure",
            "--command-timeout",
            "5",
            "--dry-run",
        ])
        .unwrap();
        let config = cli.router_config().unwrap();
        assert!(config.revert_on_failure);
        assert_eq!(config.command_timeout_secs, 5);
        assert!(cli.dry_run);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let cli = Cli::try_parse_from(["tor-router", "--command-timeout", "0"]).unwrap();
        assert!(cli.router_config().is_err());
    }

    #[test]
    fn test_config_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("router.json");
        std::fs::write(&path, r#"{ "relay_user": "tor", "command_timeout_secs": 60 }"#).unwrap();

        let cli = Cli::try_parse_from([
            "tor-router",
            "--config",
            path.to_str().unwrap(),
            "--command-timeout",
            "10",
        ])
        .unwrap();
        let config = cli.router_config().unwrap();
        assert_eq!(config.relay_user, "tor");
        assert_eq!(config.command_timeout_secs, 10);
    }
}
