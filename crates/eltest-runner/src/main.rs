//! `eltest`: synchronize with and talk to an ExpressLink module.

use clap::{ArgAction, Parser, Subcommand};
use eltest_runner::actions;
use eltest_runner::config::{ConfigOverrides, RunnerConfig};
use eltest_runner::RunnerResult;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "eltest", version, about = "Drive an ExpressLink module over its AT command interface")]
struct Cli {
    /// Path to the YAML configuration (default: eltest_config.yaml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: ConfigOverrides,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reset and synchronize the module, then print its identity as JSON.
    Reset,

    /// Print the module identity as JSON without resetting.
    Info,

    /// Send one command and print the response.
    Send {
        /// Command text, e.g. "AT+CONF? Version".
        payload: String,

        /// Synchronize before sending.
        #[arg(long)]
        reset: bool,

        /// Response timeout in milliseconds.
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Install the server root CA and/or OTA certificate from PEM files.
    InstallCerts {
        /// PEM file with the root CA.
        #[arg(long)]
        root_ca: Option<PathBuf>,

        /// PEM file with the OTA signing certificate.
        #[arg(long)]
        ota_cert: Option<PathBuf>,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> RunnerResult<()> {
    let mut config = RunnerConfig::load(cli.config.as_deref())?;
    cli.overrides.apply(&mut config)?;

    let mut engine = actions::open_engine(&config)?;
    match cli.command {
        Commands::Reset => {
            let report = actions::reset(&mut engine, config.platform.clone())?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Info => {
            let report = actions::info(&mut engine, config.platform.clone())?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Send { payload, reset, timeout_ms } => {
            if reset {
                engine.reset_device()?;
            }
            actions::send(&mut engine, &payload, timeout_ms.map(Duration::from_millis))?;
        }
        Commands::InstallCerts { root_ca, ota_cert } => {
            let root_ca = root_ca.map(std::fs::read_to_string).transpose()?;
            let ota_cert = ota_cert.map(std::fs::read_to_string).transpose()?;
            actions::install_certs(&mut engine, root_ca.as_deref(), ota_cert.as_deref())?;
        }
    }
    engine.close();
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
