//! Mapping commands - Manage the folders mirrored to the NAS
//!
//! `update` only changes the fields that were passed; everything else is
//! carried over from the stored mapping.

use anyhow::{Context, Result};
use clap::Subcommand;
use nassync_core::domain::{FolderMapping, MappingDraft, MappingId};
use nassync_core::ports::IConfigStore;

use super::AppContext;
use crate::output::{get_formatter, to_json, truncate, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum MappingCommand {
    /// List all mappings with their last run
    List,
    /// Add a mapping
    Add {
        /// Display name
        name: String,
        /// Local folder to mirror
        source: String,
        /// Destination folder on the NAS
        destination: String,
        /// Create the mapping disabled
        #[arg(long)]
        disabled: bool,
        /// Remove source files once they have been transferred
        #[arg(long)]
        delete_source: bool,
    },
    /// Change fields of an existing mapping
    Update {
        id: MappingId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        destination: Option<String>,
        #[arg(long)]
        enabled: Option<bool>,
        #[arg(long)]
        delete_source: Option<bool>,
    },
    /// Remove a mapping and its sync history
    Remove { id: MappingId },
}

impl MappingCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        match self {
            MappingCommand::List => {
                let mappings = ctx.store.list_mappings().await?;
                if format.is_json() {
                    formatter.print_json(&to_json(&mappings)?);
                } else if mappings.is_empty() {
                    formatter.info("No mappings configured");
                } else {
                    for mapping in &mappings {
                        println!("{}", format_mapping(mapping));
                    }
                }
            }
            MappingCommand::Add {
                name,
                source,
                destination,
                disabled,
                delete_source,
            } => {
                let draft = MappingDraft::new(name, source, destination)
                    .enabled(!disabled)
                    .delete_source(*delete_source);
                let id = ctx.store.create_mapping(&draft).await?;
                formatter.success(&format!("Mapping '{}' created with id {}", draft.name, id));
            }
            MappingCommand::Update {
                id,
                name,
                source,
                destination,
                enabled,
                delete_source,
            } => {
                let current = ctx
                    .store
                    .get_mapping(*id)
                    .await?
                    .with_context(|| format!("Mapping {} not found", id))?;

                let mut draft = MappingDraft::from(&current);
                if let Some(name) = name {
                    draft.name = name.clone();
                }
                if let Some(source) = source {
                    draft.source_path = source.clone();
                }
                if let Some(destination) = destination {
                    draft.destination_path = destination.clone();
                }
                if let Some(enabled) = enabled {
                    draft.enabled = *enabled;
                }
                if let Some(delete_source) = delete_source {
                    draft.delete_source = *delete_source;
                }

                ctx.store.update_mapping(*id, &draft).await?;
                formatter.success(&format!("Mapping {} updated", id));
            }
            MappingCommand::Remove { id } => {
                if ctx.store.delete_mapping(*id).await? {
                    formatter.success(&format!("Mapping {} removed", id));
                } else {
                    anyhow::bail!("Mapping {} not found", id);
                }
            }
        }
        Ok(())
    }
}

fn format_mapping(mapping: &FolderMapping) -> String {
    let state = if mapping.enabled { "on " } else { "off" };
    let last_run = match (&mapping.last_sync_at, &mapping.last_sync_status) {
        (Some(at), Some(status)) => format!("{} {}", status, at.format("%Y-%m-%d %H:%M")),
        _ => "never".to_string(),
    };
    let move_flag = if mapping.delete_source { " [move]" } else { "" };

    format!(
        "{:>4}  {}  {:<20} {} -> {}{}  ({})",
        mapping.id,
        state,
        truncate(&mapping.name, 20),
        mapping.source_path,
        mapping.destination_path,
        move_flag,
        last_run,
    )
}
