//! NAS endpoint domain entity
//!
//! The single remote host every folder mapping is mirrored to, together
//! with the key-based SSH credentials used by both the transfer tool and
//! the connection verifier.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default private key location inside the service container
pub const DEFAULT_SSH_KEY_PATH: &str = "/config/id_rsa";

/// Default SSH port
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Connection settings for the remote network-attached store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NasEndpoint {
    /// Hostname or IP address of the NAS
    pub hostname: String,
    /// User the SSH session authenticates as
    pub ssh_user: String,
    /// Path to the private key used for non-interactive authentication
    pub ssh_key_path: PathBuf,
    /// SSH port on the NAS
    pub ssh_port: u16,
}

impl NasEndpoint {
    /// Creates an endpoint with the default key path and port
    pub fn new(hostname: impl Into<String>, ssh_user: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ssh_user: ssh_user.into(),
            ssh_key_path: PathBuf::from(DEFAULT_SSH_KEY_PATH),
            ssh_port: DEFAULT_SSH_PORT,
        }
    }

    /// Overrides the private key path
    pub fn with_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ssh_key_path = path.into();
        self
    }

    /// Overrides the SSH port
    pub fn with_port(mut self, port: u16) -> Self {
        self.ssh_port = port;
        self
    }

    /// `user@host`, as understood by ssh and rsync
    pub fn login(&self) -> String {
        format!("{}@{}", self.ssh_user, self.hostname)
    }

    /// `user@host:path`, the rsync remote destination operand
    pub fn remote_target(&self, destination: &str) -> String {
        format!("{}:{}", self.login(), destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_defaults() {
        let endpoint = NasEndpoint::new("nas.local", "backup");
        assert_eq!(endpoint.ssh_port, 22);
        assert_eq!(endpoint.ssh_key_path, PathBuf::from("/config/id_rsa"));
    }

    #[test]
    fn test_remote_target() {
        let endpoint = NasEndpoint::new("192.168.1.10", "admin").with_port(2222);
        assert_eq!(endpoint.login(), "admin@192.168.1.10");
        assert_eq!(
            endpoint.remote_target("/volume1/photos"),
            "admin@192.168.1.10:/volume1/photos"
        );
    }
}
