//! Maintenance entry point for a Wings metadata store.
//!
//! # Responsibility
//! - Verify `wings_core` linkage (`ping`).
//! - Run store-level maintenance (`count`, `wipe`) against a configured store.

use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use wings_core::{MetadataAdapter, ResourceFactory, WingsConfig};

#[derive(Debug, Parser)]
#[command(name = "wings_cli", version, about = "Wings metadata store maintenance")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print core ping and version.
    Ping,
    /// Print the number of stored native objects.
    Count {
        #[arg(long)]
        config: PathBuf,
    },
    /// Remove every indexed document and stored object.
    Wipe {
        #[arg(long)]
        config: PathBuf,
        /// Required; wipe is irreversible.
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Ping => {
            println!("wings_core ping={}", wings_core::ping());
            println!("wings_core version={}", wings_core::core_version());
            Ok(())
        }
        Command::Count { config } => {
            let adapter = open_adapter(&config)?;
            let count = adapter
                .query_service()
                .count()
                .map_err(|err| err.to_string())?;
            println!("{count}");
            Ok(())
        }
        Command::Wipe { config, yes } => {
            if !yes {
                return Err("refusing to wipe without --yes".to_string());
            }
            let adapter = open_adapter(&config)?;
            adapter.persister().wipe().map_err(|err| err.to_string())?;
            info!(
                "event=cli_wipe module=cli status=ok adapter={}",
                adapter.name()
            );
            println!("wiped adapter `{}`", adapter.name());
            Ok(())
        }
    }
}

fn open_adapter(config_path: &Path) -> Result<Arc<MetadataAdapter>, String> {
    let config = WingsConfig::from_path(config_path).map_err(|err| err.to_string())?;
    wings_core::init_logging_from_config(&config.logging)?;
    MetadataAdapter::open(&config, ResourceFactory::new()).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::{run, Cli, Command};
    use clap::Parser;

    #[test]
    fn wipe_requires_confirmation() {
        let cli = Cli::parse_from(["wings_cli", "wipe", "--config", "/nonexistent.json"]);
        assert!(matches!(cli.command, Command::Wipe { yes: false, .. }));
        let err = run(cli).unwrap_err();
        assert!(err.contains("--yes"));
    }

    #[test]
    fn count_reports_missing_config() {
        let cli = Cli::parse_from(["wings_cli", "count", "--config", "/nonexistent.json"]);
        assert!(run(cli).unwrap_err().contains("failed to read config"));
    }
}
