//! Network probe port
//!
//! Reachability checks and credential verification against the NAS.
//! Neither operation can fail from the caller's point of view: problems
//! degrade to `false` or to a failed [`ConnectionCheck`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::NasEndpoint;

/// Default bound on a single reachability probe
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Default bound on the SSH connection test
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of an authenticated connection test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionCheck {
    pub ok: bool,
    /// Success text, or the remote failure text verbatim
    pub message: String,
}

impl ConnectionCheck {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Port trait for probing the NAS
#[async_trait::async_trait]
pub trait INetworkProbe: Send + Sync {
    /// `true` only when a single probe got a reply within `timeout`
    async fn is_reachable(&self, host: &str, timeout: Duration) -> bool;

    /// Opens one authenticated session and runs a no-op remote command
    async fn test_connection(&self, endpoint: &NasEndpoint, timeout: Duration) -> ConnectionCheck;
}
