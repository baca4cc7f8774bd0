mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod shell;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use crate::commands::AppState;
use crate::core::{CommandRunner, DryRunRunner, SystemRunner};

pub use cli::Cli;

pub fn run() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!("PANIC in tor-router: {info}");
        default_hook(info);
    }));

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tor_router=info,tor_router_lib=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run_shell(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run_shell(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.router_config()?;

    let runner: Arc<dyn CommandRunner> = if cli.dry_run {
        tracing::info!("Dry run: no host changes will be made");
        Arc::new(DryRunRunner::new(&config))
    } else {
        Arc::new(SystemRunner::new(&config)?)
    };

    tracing::info!(
        "Tor router ready (relay user {}, TransPort {}, resolver {})",
        config.relay_user,
        config.trans_port,
        config.resolv_conf_path.display()
    );

    let state = AppState::new(config, runner).with_export_path(&cli.export_path);
    let stdin = std::io::stdin();
    shell::Shell::new(&state, std::io::stdout(), cli.json).run(stdin.lock())?;
    Ok(())
}
