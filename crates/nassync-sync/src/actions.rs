//! HTTP adapter for the post-sync runner port
//!
//! Executes every enabled post-sync action once, in store order. Each
//! action is isolated: its failure is logged with the action's name and
//! the next action still runs.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use nassync_core::domain::{
    ActionKind, LibraryRefreshConfig, PostSyncAction, WebhookConfig, WebhookMethod,
};
use nassync_core::ports::{IConfigStore, IPostSyncRunner};

use crate::SyncError;

/// Default bound on every post-sync HTTP call
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// What happened when one action was executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The request was sent and answered with this status code
    Delivered { status: u16 },
    /// The action's configuration was incomplete; nothing was sent
    Skipped { reason: String },
}

/// [`IPostSyncRunner`] implementation issuing HTTP requests with `reqwest`
pub struct HttpPostSyncRunner {
    store: Arc<dyn IConfigStore>,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpPostSyncRunner {
    pub fn new(store: Arc<dyn IConfigStore>, timeout: Duration) -> Self {
        Self {
            store,
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// Executes a single action regardless of its enabled flag
    pub async fn execute(&self, action: &PostSyncAction) -> Result<ActionOutcome, SyncError> {
        match &action.kind {
            ActionKind::LibraryRefresh(config) => self.refresh_library(config).await,
            ActionKind::Webhook(config) => self.call_webhook(config).await,
        }
    }

    async fn refresh_library(
        &self,
        config: &LibraryRefreshConfig,
    ) -> Result<ActionOutcome, SyncError> {
        let Some(url) = config.refresh_url() else {
            warn!("Library refresh skipped: missing URL or token");
            return Ok(ActionOutcome::Skipped {
                reason: "missing URL or token".to_string(),
            });
        };

        let response = self
            .client
            .get(&url)
            .query(&[("X-Plex-Token", config.token.as_str())])
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status == 200 {
            info!(section = %config.library_section, "Library refresh triggered");
        } else {
            warn!(section = %config.library_section, status, "Library refresh returned non-200 status");
        }
        Ok(ActionOutcome::Delivered { status })
    }

    async fn call_webhook(&self, config: &WebhookConfig) -> Result<ActionOutcome, SyncError> {
        let url = config.url.trim();
        if url.is_empty() {
            warn!("Webhook skipped: missing URL");
            return Ok(ActionOutcome::Skipped {
                reason: "missing URL".to_string(),
            });
        }

        let request = match config.method {
            WebhookMethod::Get => self.client.get(url),
            WebhookMethod::Post => self.client.post(url),
        };
        let response = request.timeout(self.timeout).send().await?;

        let status = response.status().as_u16();
        info!(url, status, "Webhook called");
        Ok(ActionOutcome::Delivered { status })
    }
}

#[async_trait::async_trait]
impl IPostSyncRunner for HttpPostSyncRunner {
    async fn run_all(&self) {
        let actions = match self.store.list_post_sync_actions().await {
            Ok(actions) => actions,
            Err(e) => {
                error!(error = %format!("{e:#}"), "Failed to load post-sync actions");
                return;
            }
        };

        for action in actions.iter().filter(|a| a.enabled) {
            if let Err(e) = self.execute(action).await {
                error!(action = %action.name, error = %e, "Post-sync action failed");
            }
        }
    }
}
