mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sunpvs_core::PvsClient;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "sunpvs", &mut std::io::stdout());
            Ok(())
        }

        // Config commands don't need a supervisor connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        // The probe needs only a host, never a credential
        Command::Probe => {
            let cfg = config::load_config()?;
            let host = config::resolve_host(&cli.global, &cfg)?;
            let format = config::output_format(&cli.global, &cfg);
            let timeout = Duration::from_secs(cli.global.timeout.unwrap_or(cfg.defaults.timeout).max(1));
            commands::probe::handle(&host, timeout, format, &cli.global).await
        }

        // All other commands require a connected client
        cmd => {
            let cfg = config::load_config()?;
            let client_config = config::build_client_config(&cli.global, &cfg)?;
            let format = config::output_format(&cli.global, &cfg);

            tracing::debug!(command = ?cmd, host = %client_config.host, "connecting");
            let mut client = PvsClient::connect(client_config).await?;
            commands::dispatch(cmd, &mut client, format, &cli.global).await
        }
    }
}
