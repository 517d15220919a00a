use crate::{
    conn::{ConnectionPinger, PostgresConnectionPinger},
    env::EnvManager,
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use commands::Commands;
use engine_config::LoaderConfig;
use engine_runtime::execution::{
    executor::{self, BackfillOptions},
    oneshot::OneShotLoad,
};
use model::{
    partition::PartitionKey,
    sink::{TableRef, WriteMode},
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod conn;
mod env;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "tripload",
    version = "0.1.0",
    about = "Idempotent loader for NYC taxi trip data"
)]
struct Cli {
    /// Extra KEY=VALUE file merged over the process environment
    #[arg(long, global = true)]
    env_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    // RUST_LOG wins; info otherwise
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();

    let code = match run(cli, shutdown.cancel_token()).await {
        Ok(code) => code,
        Err(CliError::ShutdownRequested) => ExitCode::ShutdownRequested,
        Err(e) => {
            error!("{e}");
            ExitCode::GeneralError
        }
    };

    let code = if shutdown.is_shutdown_requested() {
        ExitCode::ShutdownRequested
    } else {
        code
    };

    std::process::exit(code.as_i32());
}

async fn run(cli: Cli, cancel: CancellationToken) -> Result<ExitCode, CliError> {
    let env = EnvManager::load(cli.env_file.as_deref())?;

    match cli.command {
        Commands::Backfill {
            config,
            dataset,
            until,
            force,
            max_concurrency,
            output,
        } => {
            let config = load_config(Some(config.as_str()), &env)?;
            let until = until.unwrap_or_else(|| chrono::Local::now().date_naive());
            info!(dataset = %dataset, until = %until, force, "Starting backfill");

            let report = executor::backfill(
                &config,
                BackfillOptions {
                    dataset,
                    until,
                    force,
                    max_concurrency,
                },
                cancel.clone(),
            )
            .await?;

            match output {
                Some(path) => output::write_report(&report, &path).await?,
                None => output::print_report(&report)?,
            }

            if cancel.is_cancelled() {
                return Err(CliError::ShutdownRequested);
            }
            if report.has_failures() {
                return Ok(ExitCode::GeneralError);
            }
        }
        Commands::Load {
            url,
            table,
            config,
            append,
            numeric_columns,
        } => {
            let config = load_config(config.as_deref(), &env)?;

            let mut columns = config.pipeline.numeric_columns.clone();
            for column in numeric_columns {
                if !columns.iter().any(|c| c.eq_ignore_ascii_case(&column)) {
                    columns.push(column);
                }
            }

            let load = OneShotLoad {
                url,
                table: TableRef::parse(&table, &config.sink.namespace),
                mode: if append {
                    WriteMode::Append
                } else {
                    WriteMode::CreateOrReplace
                },
                numeric_columns: columns,
            };

            let outcome = executor::load(&config, &load, cancel).await?;
            output::print_report(&outcome)?;
        }
        Commands::Resolve {
            dataset,
            date,
            config,
        } => {
            let config = load_config(config.as_deref(), &env)?;
            let key = PartitionKey::containing(config.schedule.granularity, date);
            let resolver = config.resolver();
            let descriptor = resolver.resolve(&dataset, &key)?;
            let table = resolver.table(&dataset, &key)?;

            output::print_report(&serde_json::json!({
                "partition": key.to_string(),
                "url": descriptor.url,
                "format": descriptor.format.to_string(),
                "filename": descriptor.filename,
                "staged_path": descriptor.staged_path(),
                "table": table.to_string(),
            }))?;
        }
        Commands::Status {
            dataset,
            config,
            json,
        } => {
            let config = load_config(config.as_deref(), &env)?;
            let status = executor::status(&config, &dataset).await?;
            if json {
                output::print_report(&status)?;
            } else {
                output::print_status_table(&status);
            }
        }
        Commands::TestConn { config, url } => {
            let conn_str = match url {
                Some(url) => url,
                None => {
                    let config = load_config(config.as_deref(), &env)?;
                    config.sink_url()?.to_string()
                }
            };
            PostgresConnectionPinger { conn_str }.ping().await?;
        }
    }

    Ok(ExitCode::Success)
}

/// File (or built-in defaults), then environment overrides, then validation.
fn load_config(path: Option<&str>, env: &EnvManager) -> Result<LoaderConfig, CliError> {
    let mut config = match path {
        Some(path) => LoaderConfig::from_file(path)?,
        None => LoaderConfig::default(),
    };
    config.apply_env(env.all());
    config.validate()?;
    Ok(config)
}
