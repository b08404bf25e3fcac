//! Action commands - Manage post-sync actions
//!
//! Provides `nassync action ...` which:
//! 1. Lists actions with their kind and target
//! 2. Adds webhook and library-refresh actions
//! 3. Enables, disables or removes an action
//! 4. Fires one action immediately (`test`), enabled or not

use anyhow::{Context, Result};
use clap::Subcommand;
use nassync_core::domain::action::DEFAULT_LIBRARY_SECTION;
use nassync_core::domain::{
    ActionId, ActionKind, LibraryRefreshConfig, PostSyncAction, WebhookConfig, WebhookMethod,
};
use nassync_core::ports::IConfigStore;
use nassync_sync::{ActionOutcome, HttpPostSyncRunner};
use serde_json::json;

use super::AppContext;
use crate::output::{get_formatter, to_json, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ActionCommand {
    /// List post-sync actions
    List,
    /// Add a webhook called after every sync that transferred data
    AddWebhook {
        name: String,
        url: String,
        /// HTTP method, GET or POST
        #[arg(long, default_value = "POST")]
        method: String,
    },
    /// Add a media-library refresh
    AddLibraryRefresh {
        name: String,
        /// Base URL of the media server, e.g. http://plex.local:32400
        base_url: String,
        /// Access token
        #[arg(long)]
        token: String,
        /// Library section to refresh
        #[arg(long, default_value = DEFAULT_LIBRARY_SECTION)]
        section: String,
    },
    /// Enable an action
    Enable { id: ActionId },
    /// Disable an action
    Disable { id: ActionId },
    /// Remove an action
    Remove { id: ActionId },
    /// Execute an action now
    Test { id: ActionId },
}

impl ActionCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        match self {
            ActionCommand::List => {
                let actions = ctx.store.list_post_sync_actions().await?;
                if format.is_json() {
                    formatter.print_json(&to_json(&actions)?);
                } else if actions.is_empty() {
                    formatter.info("No post-sync actions configured");
                } else {
                    for action in &actions {
                        println!("{}", format_action(action));
                    }
                }
            }
            ActionCommand::AddWebhook { name, url, method } => {
                let kind =
                    ActionKind::Webhook(WebhookConfig::new(url, WebhookMethod::from(method.as_str())));
                let id = ctx.store.create_post_sync_action(name, &kind).await?;
                formatter.success(&format!("Webhook '{}' created with id {}", name, id));
            }
            ActionCommand::AddLibraryRefresh {
                name,
                base_url,
                token,
                section,
            } => {
                let kind = ActionKind::LibraryRefresh(
                    LibraryRefreshConfig::new(base_url, token).with_section(section),
                );
                let id = ctx.store.create_post_sync_action(name, &kind).await?;
                formatter.success(&format!("Library refresh '{}' created with id {}", name, id));
            }
            ActionCommand::Enable { id } => {
                set_enabled(ctx, *id, true).await?;
                formatter.success(&format!("Action {} enabled", id));
            }
            ActionCommand::Disable { id } => {
                set_enabled(ctx, *id, false).await?;
                formatter.success(&format!("Action {} disabled", id));
            }
            ActionCommand::Remove { id } => {
                if !ctx.store.delete_post_sync_action(*id).await? {
                    anyhow::bail!("Action {} not found", id);
                }
                formatter.success(&format!("Action {} removed", id));
            }
            ActionCommand::Test { id } => {
                let action = find_action(ctx, *id).await?;
                let runner = HttpPostSyncRunner::new(ctx.store.clone(), ctx.config.timeouts.http());
                let outcome = runner
                    .execute(&action)
                    .await
                    .with_context(|| format!("Action '{}' failed", action.name))?;

                match outcome {
                    ActionOutcome::Delivered { status } => {
                        if format.is_json() {
                            formatter.print_json(&json!({"action": action.name, "status": status}));
                        } else {
                            formatter.success(&format!("'{}' answered HTTP {}", action.name, status));
                        }
                    }
                    ActionOutcome::Skipped { reason } => {
                        if format.is_json() {
                            formatter.print_json(&json!({"action": action.name, "skipped": reason}));
                        } else {
                            formatter.warn(&format!("'{}' skipped: {}", action.name, reason));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

async fn find_action(ctx: &AppContext, id: ActionId) -> Result<PostSyncAction> {
    ctx.store
        .list_post_sync_actions()
        .await?
        .into_iter()
        .find(|a| a.id == id)
        .with_context(|| format!("Action {} not found", id))
}

async fn set_enabled(ctx: &AppContext, id: ActionId, enabled: bool) -> Result<()> {
    let action = find_action(ctx, id).await?;
    ctx.store
        .update_post_sync_action(id, &action.name, &action.kind, enabled)
        .await?;
    Ok(())
}

/// One listing line; the library token is never printed
fn format_action(action: &PostSyncAction) -> String {
    let state = if action.enabled { "on " } else { "off" };
    let target = match &action.kind {
        ActionKind::LibraryRefresh(config) => {
            format!("{} section {}", config.base_url, config.library_section)
        }
        ActionKind::Webhook(config) => {
            format!("{} {}", String::from(config.method), config.url)
        }
    };
    format!(
        "{:>4}  {}  {:<20} {:<16} {}",
        action.id,
        state,
        action.name,
        action.kind.type_name(),
        target
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support;

    #[tokio::test]
    async fn test_add_disable_enable_remove() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_support::context(&dir).await;

        ActionCommand::AddWebhook {
            name: "notify".into(),
            url: "http://hooks.local/done".into(),
            method: "get".into(),
        }
        .execute(&ctx, OutputFormat::Json)
        .await
        .unwrap();

        let action = ctx.store.list_post_sync_actions().await.unwrap().remove(0);
        assert!(action.enabled);
        assert_eq!(
            action.kind,
            ActionKind::Webhook(WebhookConfig::new("http://hooks.local/done", WebhookMethod::Get))
        );

        ActionCommand::Disable { id: action.id }
            .execute(&ctx, OutputFormat::Json)
            .await
            .unwrap();
        let stored = find_action(&ctx, action.id).await.unwrap();
        assert!(!stored.enabled);
        assert_eq!(stored.kind, action.kind);

        ActionCommand::Enable { id: action.id }
            .execute(&ctx, OutputFormat::Json)
            .await
            .unwrap();
        assert!(find_action(&ctx, action.id).await.unwrap().enabled);

        ActionCommand::Remove { id: action.id }
            .execute(&ctx, OutputFormat::Json)
            .await
            .unwrap();
        assert!(ctx.store.list_post_sync_actions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_action_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_support::context(&dir).await;

        let err = ActionCommand::Enable { id: ActionId::new(99) }
            .execute(&ctx, OutputFormat::Json)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_library_refresh_without_token_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_support::context(&dir).await;

        ActionCommand::AddLibraryRefresh {
            name: "plex".into(),
            base_url: "http://plex.local:32400".into(),
            token: String::new(),
            section: "2".into(),
        }
        .execute(&ctx, OutputFormat::Json)
        .await
        .unwrap();

        let id = ctx.store.list_post_sync_actions().await.unwrap()[0].id;
        ActionCommand::Test { id }
            .execute(&ctx, OutputFormat::Json)
            .await
            .unwrap();
    }

    #[test]
    fn test_format_action_hides_token() {
        let action = PostSyncAction {
            id: ActionId::new(1),
            name: "plex".into(),
            kind: ActionKind::LibraryRefresh(
                LibraryRefreshConfig::new("http://plex.local:32400", "secret-token").with_section("4"),
            ),
            enabled: true,
        };
        let line = format_action(&action);
        assert!(line.contains("library_refresh"));
        assert!(line.contains("http://plex.local:32400 section 4"));
        assert!(!line.contains("secret-token"));
    }
}
