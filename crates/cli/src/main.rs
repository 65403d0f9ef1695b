use crate::{
    env::EnvManager,
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use commands::Commands;
use engine_runtime::{
    error::RunError,
    execution::executor,
    settings::{SyncSettings, validated::ValidatedSettings},
};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod env;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "gsc-sync",
    version,
    about = "Incremental Search Console analytics sync"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    // Initialize logger
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match execute(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "gsc-sync failed");
            ExitCode::GeneralError
        }
    };

    std::process::exit(code.as_i32());
}

async fn execute(command: Commands) -> Result<ExitCode, CliError> {
    match command {
        Commands::Run {
            config,
            env_file,
            json,
            output,
        } => {
            let env = load_env(env_file.as_deref())?;
            let settings = load_settings(config, &env).await?;

            let shutdown = ShutdownCoordinator::new(CancellationToken::new());
            shutdown.register_handlers();

            let report = match executor::run(settings, env.all(), shutdown.cancel_token()).await
            {
                Ok(report) => report,
                Err(RunError::Sync(e)) => {
                    error!(kind = %e.kind(), error = %e, "Run aborted before syncing");
                    return Ok(ExitCode::GeneralError);
                }
                Err(e) => return Err(e.into()),
            };

            if let Some(path) = output {
                output::write_report(&report, &path).await?;
            }
            output::print_report(&report, json)?;

            if shutdown.is_shutdown_requested() {
                info!("Stopped after shutdown request");
            }
            Ok(output::exit_code(report.status))
        }
        Commands::Validate { config, env_file } => {
            let env = load_env(env_file.as_deref())?;
            let settings = load_settings(config, &env).await?;
            let names: Vec<&str> = settings.targets.iter().map(|t| t.name()).collect();
            println!(
                "Config OK: site {}, {} sink, targets [{}], anchor {}",
                settings.site_url,
                settings.sink.kind(),
                names.join(", "),
                settings.anchor().name()
            );
            Ok(ExitCode::Success)
        }
    }
}

fn load_env(env_file: Option<&str>) -> Result<EnvManager, CliError> {
    let mut env = EnvManager::new();
    match env_file {
        Some(path) => env.load_from_file(path)?,
        None => {
            if env.load_default_file()? {
                info!("Loaded variables from .env");
            }
        }
    }
    Ok(env)
}

async fn load_settings(
    config: Option<String>,
    env: &EnvManager,
) -> Result<ValidatedSettings, CliError> {
    let path = match config {
        Some(path) => PathBuf::from(path),
        None => default_config_path()?,
    };
    info!(config = %path.display(), "Loading config");
    Ok(SyncSettings::load(&path, env.all()).await?.validate()?)
}

fn default_config_path() -> Result<PathBuf, CliError> {
    let home = dirs::home_dir()
        .ok_or_else(|| CliError::Config("Could not determine home directory".into()))?;
    Ok(home.join(".gsc-sync/config.json"))
}
