//! nassync CLI - Command-line interface for nassync
//!
//! Provides commands for:
//! - Running a sync of every mapping or of a single one
//! - Checking that the NAS is reachable and accepts the SSH key
//! - Reading the sync history
//! - Managing the endpoint, folder mappings, post-sync actions and schedule

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    action::ActionCommand,
    connection::{PingCommand, TestConnectionCommand},
    endpoint::EndpointCommand,
    logs::LogsCommand,
    mapping::MappingCommand,
    scheduler::SchedulerCommand,
    sync::SyncCommand,
    AppContext,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "nassync", version, about = "Mirror local folders to a NAS over rsync")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true, env = "NASSYNC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sync all enabled mappings, or one mapping by id
    Sync(SyncCommand),
    /// Verify SSH key authentication against the NAS
    TestConnection(TestConnectionCommand),
    /// Check whether the NAS answers a ping
    Ping(PingCommand),
    /// Show recent sync history
    Logs(LogsCommand),
    /// View or change the NAS endpoint
    #[command(subcommand)]
    Endpoint(EndpointCommand),
    /// Manage folder mappings
    #[command(subcommand)]
    Mapping(MappingCommand),
    /// Manage post-sync actions
    #[command(subcommand)]
    Action(ActionCommand),
    /// View or change the sync schedule
    #[command(subcommand)]
    Scheduler(SchedulerCommand),
}

/// `-v` flags override the configured level
fn log_level(verbose: u8, configured: &str) -> &str {
    match verbose {
        0 => configured,
        1 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppContext::load_config(cli.config.as_deref())?;

    // Setup tracing
    let filter = log_level(cli.verbose, &config.logging.level);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    let ctx = AppContext::with_config(config).await?;

    match cli.command {
        Commands::Sync(cmd) => cmd.execute(&ctx, format).await,
        Commands::TestConnection(cmd) => cmd.execute(&ctx, format).await,
        Commands::Ping(cmd) => cmd.execute(&ctx, format).await,
        Commands::Logs(cmd) => cmd.execute(&ctx, format).await,
        Commands::Endpoint(cmd) => cmd.execute(&ctx, format).await,
        Commands::Mapping(cmd) => cmd.execute(&ctx, format).await,
        Commands::Action(cmd) => cmd.execute(&ctx, format).await,
        Commands::Scheduler(cmd) => cmd.execute(&ctx, format).await,
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["nassync", "logs", "--json", "-vv"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Logs(_)));
    }

    #[test]
    fn test_log_level_defaults_to_config() {
        assert_eq!(log_level(0, "warn"), "warn");
        assert_eq!(log_level(1, "warn"), "debug");
        assert_eq!(log_level(3, "warn"), "trace");
    }

    #[test]
    fn test_kebab_case_subcommand() {
        let cli = Cli::try_parse_from(["nassync", "test-connection"]).unwrap();
        assert!(matches!(cli.command, Commands::TestConnection(_)));
    }
}
