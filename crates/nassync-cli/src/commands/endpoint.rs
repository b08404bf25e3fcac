//! Endpoint commands - View or change the NAS connection settings

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use nassync_core::domain::endpoint::{DEFAULT_SSH_KEY_PATH, DEFAULT_SSH_PORT};
use nassync_core::domain::NasEndpoint;
use nassync_core::ports::IConfigStore;

use super::AppContext;
use crate::output::{get_formatter, to_json, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum EndpointCommand {
    /// Show the saved endpoint
    Show,
    /// Save the endpoint, replacing any previous one
    Set {
        /// Hostname or IP address of the NAS
        hostname: String,
        /// SSH user on the NAS
        user: String,
        /// Private key used for authentication
        #[arg(long, default_value = DEFAULT_SSH_KEY_PATH)]
        key: PathBuf,
        /// SSH port
        #[arg(long, default_value_t = DEFAULT_SSH_PORT)]
        port: u16,
    },
}

impl EndpointCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        match self {
            EndpointCommand::Show => {
                let endpoint = ctx.store.get_endpoint().await?;
                if format.is_json() {
                    formatter.print_json(&to_json(&endpoint)?);
                    return Ok(());
                }
                match endpoint {
                    Some(e) => {
                        println!("Host:     {}", e.hostname);
                        println!("User:     {}", e.ssh_user);
                        println!("Port:     {}", e.ssh_port);
                        println!("Key:      {}", e.ssh_key_path.display());
                    }
                    None => formatter.warn("No NAS configuration saved"),
                }
            }
            EndpointCommand::Set {
                hostname,
                user,
                key,
                port,
            } => {
                let endpoint = NasEndpoint::new(hostname.trim(), user.trim())
                    .with_key_path(key)
                    .with_port(*port);
                ctx.store.save_endpoint(&endpoint).await?;
                formatter.success(&format!("Endpoint saved: {}", endpoint.login()));
            }
        }
        Ok(())
    }
}
