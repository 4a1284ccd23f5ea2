//! Command-line interface parsing for the acronym CLI
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! the command to run plus the resolver configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::config::{default_database_path, ResolverConfig};

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// Neither an acronym nor --list/--clear was given
    #[error("Nothing to do: give an acronym to look up, or use --list or --clear")]
    NoCommand,

    /// No database path was given and no cache directory could be found
    #[error("Cannot determine the cache directory; pass --db <PATH>")]
    NoDatabasePath,
}

/// Acronym CLI - Look up what an acronym stands for
#[derive(Parser, Debug)]
#[command(name = "acronym")]
#[command(about = "Look up acronym expansions, with a local cache")]
#[command(version)]
pub struct Cli {
    /// Acronym to look up (letters, digits, '.', '_' and '-' are kept)
    #[arg(value_name = "ACRONYM")]
    pub name: Option<String>,

    /// List every acronym in the cache
    #[arg(long, conflicts_with_all = ["name", "clear"])]
    pub list: bool,

    /// Remove every acronym from the cache
    #[arg(long, conflicts_with = "name")]
    pub clear: bool,

    /// Refresh cached expansions older than this many days (0 = never)
    #[arg(long, value_name = "DAYS")]
    pub ttl_days: Option<u64>,

    /// Acronym server URL (the acronym is appended as the query string)
    #[arg(long, value_name = "URL", env = "ACRONYM_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Cache database file
    #[arg(long, value_name = "PATH", env = "ACRONYM_DB")]
    pub db: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,
}

/// What the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Look up one acronym
    Resolve(String),
    /// List the cache
    ListAll,
    /// Empty the cache
    Clear,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub command: Command,
    pub resolver: ResolverConfig,
    pub db_path: PathBuf,
    pub json: bool,
    pub debug: bool,
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if no command was given or no database path is known
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let command = match (&cli.name, cli.list, cli.clear) {
            (_, true, _) => Command::ListAll,
            (_, _, true) => Command::Clear,
            (Some(name), _, _) => Command::Resolve(name.clone()),
            (None, false, false) => return Err(CliError::NoCommand),
        };

        let mut resolver = ResolverConfig::default();
        if let Some(days) = cli.ttl_days {
            resolver.ttl = Duration::from_secs(days.saturating_mul(24 * 60 * 60));
        }
        if let Some(endpoint) = &cli.endpoint {
            resolver.endpoint = endpoint.clone();
        }

        let db_path = match &cli.db {
            Some(path) => path.clone(),
            None => default_database_path().ok_or(CliError::NoDatabasePath)?,
        };

        Ok(StartupConfig {
            command,
            resolver,
            db_path,
            json: cli.json,
            debug: cli.debug,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TTL;

    #[test]
    fn test_cli_parse_name() {
        let cli = Cli::try_parse_from(["acronym", "FAQ"]).unwrap();
        assert_eq!(cli.name.as_deref(), Some("FAQ"));
        assert!(!cli.list);
        assert!(!cli.clear);
    }

    #[test]
    fn test_cli_parse_list() {
        let cli = Cli::try_parse_from(["acronym", "--list"]).unwrap();
        assert!(cli.list);
        assert!(cli.name.is_none());
    }

    #[test]
    fn test_cli_list_conflicts_with_name() {
        assert!(Cli::try_parse_from(["acronym", "--list", "FAQ"]).is_err());
        assert!(Cli::try_parse_from(["acronym", "--list", "--clear"]).is_err());
        assert!(Cli::try_parse_from(["acronym", "--clear", "FAQ"]).is_err());
    }

    #[test]
    fn test_startup_config_resolve() {
        let cli = Cli::try_parse_from(["acronym", "FAQ", "--db", "/tmp/a.db"]).unwrap();
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.command, Command::Resolve("FAQ".to_string()));
        assert_eq!(config.resolver.ttl, DEFAULT_TTL);
        assert_eq!(config.db_path, PathBuf::from("/tmp/a.db"));
        assert!(!config.json);
    }

    #[test]
    fn test_startup_config_list_and_clear() {
        let cli = Cli::try_parse_from(["acronym", "--list", "--db", "/tmp/a.db"]).unwrap();
        assert_eq!(StartupConfig::from_cli(&cli).unwrap().command, Command::ListAll);

        let cli = Cli::try_parse_from(["acronym", "--clear", "--db", "/tmp/a.db"]).unwrap();
        assert_eq!(StartupConfig::from_cli(&cli).unwrap().command, Command::Clear);
    }

    #[test]
    fn test_startup_config_overrides() {
        let cli = Cli::try_parse_from([
            "acronym",
            "FAQ",
            "--ttl-days",
            "1",
            "--endpoint",
            "http://localhost:8080/xaa",
            "--db",
            "/tmp/a.db",
            "--json",
            "--debug",
        ])
        .unwrap();
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.resolver.ttl, Duration::from_secs(86_400));
        assert_eq!(config.resolver.endpoint, "http://localhost:8080/xaa");
        assert!(config.json);
        assert!(config.debug);
    }

    #[test]
    fn test_startup_config_no_command() {
        let cli = Cli::try_parse_from(["acronym", "--db", "/tmp/a.db"]).unwrap();
        let result = StartupConfig::from_cli(&cli);
        assert!(matches!(result, Err(CliError::NoCommand)));
        assert!(result.unwrap_err().to_string().contains("--list"));
    }
}
