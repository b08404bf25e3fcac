//! Connectivity commands
//!
//! `nassync test-connection` runs a non-interactive SSH login with the
//! saved key; `nassync ping` only checks that the host answers.

use anyhow::Result;
use clap::Args;
use nassync_core::ports::INetworkProbe;
use serde_json::json;

use super::AppContext;
use crate::output::{get_formatter, to_json, OutputFormat};

#[derive(Debug, Args)]
pub struct TestConnectionCommand {
    /// Connect timeout in seconds (defaults to the configured value)
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl TestConnectionCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let endpoint = ctx.require_endpoint().await?;
        let timeout = self
            .timeout
            .map(std::time::Duration::from_secs)
            .unwrap_or_else(|| ctx.config.timeouts.connect());

        let check = ctx.probe().test_connection(&endpoint, timeout).await;

        if format.is_json() {
            formatter.print_json(&to_json(&check)?);
        } else if check.ok {
            formatter.success(&format!("{} ({})", check.message, endpoint.login()));
        } else {
            formatter.error(&check.message);
        }

        if !check.ok {
            anyhow::bail!("SSH connection to {} failed", endpoint.hostname);
        }
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct PingCommand {}

impl PingCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let endpoint = ctx.require_endpoint().await?;

        let online = ctx
            .probe()
            .is_reachable(&endpoint.hostname, ctx.config.timeouts.probe())
            .await;

        if format.is_json() {
            formatter.print_json(&json!({
                "hostname": endpoint.hostname,
                "online": online,
            }));
        } else if online {
            formatter.success(&format!("{} is online", endpoint.hostname));
        } else {
            formatter.error(&format!("{} is offline", endpoint.hostname));
        }
        Ok(())
    }
}
