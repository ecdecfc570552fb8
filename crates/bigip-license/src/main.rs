mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::{ArgMatches, CommandFactory, FromArgMatches};
use tracing_subscriber::EnvFilter;

use bigip_core::DeviceSession;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments, keeping the matches to tell flags from defaults
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli, &matches).await {
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

async fn run(mut cli: Cli, matches: &ArgMatches) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    if let Err(err) = config::apply_output_defaults(&mut cli.global, &cfg.defaults, matches) {
        // `config` stays usable so a bad default can be repaired
        if !matches!(cli.command, Command::Config(_)) {
            return Err(err);
        }
        tracing::warn!("{err}");
    }

    match cli.command {
        // Config commands don't need a device connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        // Shell completions generation
        Command::Completions(args) => {
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "bigip-license", &mut std::io::stdout());
            Ok(())
        }

        // Endpoint selection is offline
        Command::Endpoint(ref args) => commands::endpoint::handle(args, &cfg, &cli.global),

        // All other commands require a device session
        cmd => {
            let session_config = config::resolve_session_config(&cli.global, &cfg)?;
            let controller = DeviceSession::open(&session_config)?.into_controller();

            tracing::debug!(command = ?cmd, url = %session_config.url, "dispatching command");
            commands::dispatch(cmd, &controller, &cfg, &cli.global).await
        }
    }
}
