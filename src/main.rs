//! Acronym CLI - Look up what an acronym stands for
//!
//! Answers from a local SQLite cache when it is fresh and asks the acronym
//! server otherwise.

use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use acronym::cache::SqliteStore;
use acronym::cli::{Cli, Command, StartupConfig};
use acronym::data::{RemoteClient, ResolutionResult, StatusKind};
use acronym::render::render_records;
use acronym::resolver::Resolver;
use acronym::worker::ResolverHandle;

/// Sets up logging to stderr
///
/// `--debug` forces debug output; otherwise `RUST_LOG` is honored, defaulting
/// to warnings only.
fn setup_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Prints a result and returns the matching exit code
fn report(
    result: &ResolutionResult,
    json: bool,
    empty_message: &str,
) -> Result<ExitCode, Box<dyn Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else if result.is_success() {
        print!("{}", render_records(result, empty_message));
    } else {
        eprintln!("Error: {}", result.status);
    }

    Ok(match result.status {
        StatusKind::Ok => ExitCode::SUCCESS,
        StatusKind::InvalidInput => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    })
}

async fn run(config: StartupConfig) -> Result<ExitCode, Box<dyn Error>> {
    let store = Arc::new(SqliteStore::open(&config.db_path)?);
    let source = Arc::new(RemoteClient::new(&config.resolver)?);
    let resolver = Resolver::new(store, source, config.resolver.clone());
    let handle = ResolverHandle::spawn(resolver);

    let code = match &config.command {
        Command::Resolve(name) => {
            let result = handle.resolve(name.as_str()).await?;
            report(&result, config.json, &format!("No expansion found for {}.", name))?
        }
        Command::ListAll => {
            let result = handle.list_all().await?;
            report(&result, config.json, "No acronyms cached.")?
        }
        Command::Clear => {
            let result = handle.clear().await?;
            report(&result, config.json, "Cache cleared.")?
        }
    };

    handle.shutdown().await;
    Ok(code)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    setup_logging(config.debug);

    match run(config).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
