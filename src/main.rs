//! avdkit - Android Virtual Device provisioning
//!
//! Entry point: sets up logging, loads settings and runs one command.

use std::process::ExitCode;
use anyhow::Result;
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use avdkit::cli::{Cli, Cmd};
use avdkit::commands::*;
use avdkit_core::{AvdError, ErrorKind, VERSION};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    debug!("avdkit v{}", VERSION);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<AvdError>() {
            Some(avd_error) => {
                error!("{}", avd_error.user_message());
                if let Some(output) = avd_error.tool_output() {
                    error!("Tool output:\n{}", output);
                }
                ExitCode::from(exit_code(avd_error.kind()))
            }
            None => {
                error!("{:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}

/// Log to stderr so stdout carries only command output
fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))
}

fn exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::InvalidInput => 2,
        ErrorKind::Discovery => 3,
        ErrorKind::Configuration => 4,
        ErrorKind::CreationFailure => 5,
        ErrorKind::CreationAborted => 6,
        ErrorKind::CreationInterrupted => 130,
        ErrorKind::DeletionFailure => 7,
    }
}

async fn run(cli: Cli) -> Result<()> {
    let session = Session::load(cli.config, cli.sdk_root, cli.sdk_home, cli.json).await?;

    match cli.cmd {
        Cmd::Name { avd } => {
            NameCommand {
                request: avd.to_request(),
            }
            .execute(&session)?;
        }
        Cmd::Ensure { avd, settle_ms } => {
            EnsureCommand {
                request: avd.to_request(),
                settle_ms,
            }
            .execute(&session)
            .await?;
        }
        Cmd::Configure { avd, hardware } => {
            ConfigureCommand {
                request: avd.to_request(),
                hardware,
            }
            .execute(&session)
            .await?;
        }
        Cmd::Delete { avd } => {
            DeleteCommand {
                request: avd.to_request(),
            }
            .execute(&session)
            .await?;
        }
        Cmd::Args {
            avd,
            port,
            adb_port,
            callback_port,
            timeout,
            write_auth_file,
        } => {
            ArgsCommand {
                request: avd.to_request(),
                port,
                adb_port,
                callback_port,
                timeout,
                write_auth_file,
            }
            .execute(&session)
            .await?;
        }
        Cmd::Platforms => PlatformsCommand.execute(&session)?,
        Cmd::Devices => DevicesCommand.execute(&session)?,
    }

    Ok(())
}
