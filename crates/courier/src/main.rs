// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Courier - reminder email dispatcher with provider failover.
//!
//! This is the binary entry point.

mod maintenance;
mod serve;
mod shutdown;

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use courier_config::{ConfigError, CourierConfig};
use courier_core::CourierError;
use courier_dispatch::ProviderRegistry;
use courier_storage::Collection;

/// Courier - reminder email dispatcher with provider failover.
#[derive(Parser, Debug)]
#[command(name = "courier", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway (and the cron runner when enabled).
    Serve,
    /// Run one reminder pass now and print the summary.
    Process,
    /// List configured providers with credentials masked.
    Providers,
    /// Check the database and print row counts.
    Status,
    /// Delete every row of one collection (development only).
    Wipe {
        /// reminders, invite_logs, mail_logs or provider_quota.
        collection: Collection,
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<CourierConfig, Vec<ConfigError>> {
    match path {
        Some(path) => courier_config::load_and_validate_path(path),
        None => courier_config::load_and_validate(),
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("courier={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(value: &impl serde::Serialize) -> Result<(), CourierError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| CourierError::Internal(format!("failed to render output: {e}")))?;
    println!("{rendered}");
    Ok(())
}

async fn run(command: Commands, config: CourierConfig) -> Result<(), CourierError> {
    match command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Process => {
            let services = serve::Services::build(&config).await?;
            let outcome = services.trigger.process_due(Utc::now()).await;
            services.shutdown().await?;
            print_json(&outcome?)
        }
        Commands::Providers => {
            let registry = ProviderRegistry::from_configs(config.providers);
            print_json(&registry.summaries())
        }
        Commands::Status => print_json(&maintenance::run_status(&config).await?),
        Commands::Wipe { collection, yes } => {
            let deleted = maintenance::run_wipe(&config, collection, yes).await?;
            println!("deleted {deleted} row(s) from {collection}");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            courier_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.app.log_level);
    tracing::debug!(
        name = %config.app.name,
        environment = %config.app.environment,
        "config loaded"
    );

    let Some(command) = cli.command else {
        println!("courier: use --help for available commands");
        return;
    };

    if let Err(e) = run(command, config).await {
        tracing::error!(error = %e, "command failed");
        eprintln!("courier: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_loads_config_defaults() {
        let config = courier_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.app.name, "courier");
    }

    #[test]
    fn parses_wipe_with_confirmation() {
        let cli = Cli::try_parse_from(["courier", "wipe", "mail_logs", "--yes"]).unwrap();
        match cli.command {
            Some(Commands::Wipe { collection, yes }) => {
                assert_eq!(collection, Collection::MailLogs);
                assert!(yes);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_collection() {
        assert!(Cli::try_parse_from(["courier", "wipe", "users"]).is_err());
    }

    #[test]
    fn global_config_flag() {
        let cli = Cli::try_parse_from(["courier", "process", "--config", "/tmp/c.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(cli.command, Some(Commands::Process)));
    }
}
