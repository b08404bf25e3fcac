//! Network probe adapter backed by the system `ping` and `ssh` binaries
//!
//! Neither operation ever returns an error: a probe that cannot be
//! launched means "not reachable", and a connection test that cannot be
//! launched yields a failed [`ConnectionCheck`] describing why.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, warn};

use nassync_core::domain::NasEndpoint;
use nassync_core::ports::{ConnectionCheck, INetworkProbe};

use crate::SyncError;

/// Extra time granted to a child process beyond its own timeout flag
const PROCESS_GRACE: Duration = Duration::from_secs(3);

/// Remote command run by the connection test
const NOOP_REMOTE_COMMAND: &str = "echo 'Connection successful'";

/// [`INetworkProbe`] implementation shelling out to `ping` and `ssh`
#[derive(Debug, Clone)]
pub struct SystemProbe {
    ping: PathBuf,
    ssh: PathBuf,
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new("ping", "ssh")
    }
}

impl SystemProbe {
    pub fn new(ping: impl Into<PathBuf>, ssh: impl Into<PathBuf>) -> Self {
        Self {
            ping: ping.into(),
            ssh: ssh.into(),
        }
    }

    /// Arguments for a single ICMP echo bounded by `timeout`
    fn ping_args(host: &str, timeout: Duration) -> Vec<String> {
        vec![
            "-c".to_string(),
            "1".to_string(),
            "-W".to_string(),
            whole_seconds(timeout).to_string(),
            host.to_string(),
        ]
    }

    /// Arguments for a non-interactive session that runs a no-op command
    fn ssh_args(endpoint: &NasEndpoint, timeout: Duration) -> Vec<String> {
        vec![
            "-i".to_string(),
            endpoint.ssh_key_path.to_string_lossy().to_string(),
            "-p".to_string(),
            endpoint.ssh_port.to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", whole_seconds(timeout)),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            endpoint.login(),
            NOOP_REMOTE_COMMAND.to_string(),
        ]
    }

    async fn run_ssh(
        &self,
        endpoint: &NasEndpoint,
        timeout: Duration,
    ) -> Result<std::process::Output, SyncError> {
        let child = Command::new(&self.ssh)
            .args(Self::ssh_args(endpoint, timeout))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(timeout + PROCESS_GRACE, child).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(source)) => Err(SyncError::ToolLaunch {
                tool: self.ssh.display().to_string(),
                source,
            }),
            Err(_) => Err(SyncError::ToolTimeout {
                tool: self.ssh.display().to_string(),
                seconds: (timeout + PROCESS_GRACE).as_secs(),
            }),
        }
    }
}

#[async_trait::async_trait]
impl INetworkProbe for SystemProbe {
    async fn is_reachable(&self, host: &str, timeout: Duration) -> bool {
        let child = Command::new(&self.ping)
            .args(Self::ping_args(host, timeout))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        match tokio::time::timeout(timeout + PROCESS_GRACE, child).await {
            Ok(Ok(status)) => {
                debug!(host, reachable = status.success(), "Probe finished");
                status.success()
            }
            Ok(Err(e)) => {
                warn!(host, error = %e, tool = %self.ping.display(), "Failed to launch probe");
                false
            }
            Err(_) => {
                debug!(host, "Probe timed out");
                false
            }
        }
    }

    async fn test_connection(&self, endpoint: &NasEndpoint, timeout: Duration) -> ConnectionCheck {
        info!(host = %endpoint.hostname, user = %endpoint.ssh_user, port = endpoint.ssh_port, "Testing SSH connection");

        match self.run_ssh(endpoint, timeout).await {
            Ok(output) if output.status.success() => {
                ConnectionCheck::success("SSH connection successful")
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let stderr = stderr.trim();
                let detail = if stderr.is_empty() {
                    "Unknown SSH error"
                } else {
                    stderr
                };
                ConnectionCheck::failure(format!("SSH connection failed: {}", detail))
            }
            Err(e) => {
                warn!(host = %endpoint.hostname, error = %e, "SSH test could not run");
                ConnectionCheck::failure(format!("SSH test error: {}", e))
            }
        }
    }
}

/// Timeout in whole seconds, never below one
fn whole_seconds(timeout: Duration) -> u64 {
    timeout.as_secs().max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_args() {
        let args = SystemProbe::ping_args("nas.local", Duration::from_millis(500));
        assert_eq!(args, vec!["-c", "1", "-W", "1", "nas.local"]);
    }

    #[test]
    fn test_ssh_args_are_non_interactive() {
        let endpoint = NasEndpoint::new("nas.local", "backup")
            .with_key_path("/keys/id")
            .with_port(2222);
        let args = SystemProbe::ssh_args(&endpoint, Duration::from_secs(5));

        assert_eq!(&args[..4], &["-i", "/keys/id", "-p", "2222"]);
        assert!(args.contains(&"BatchMode=yes".to_string()));
        assert!(args.contains(&"StrictHostKeyChecking=accept-new".to_string()));
        assert!(args.contains(&"ConnectTimeout=5".to_string()));
        assert_eq!(args[args.len() - 2], "backup@nas.local");
    }

    #[tokio::test]
    async fn test_missing_ping_binary_is_unreachable() {
        let probe = SystemProbe::new("/nonexistent/ping-binary", "ssh");
        assert!(
            !probe
                .is_reachable("127.0.0.1", Duration::from_secs(1))
                .await
        );
    }

    #[tokio::test]
    async fn test_missing_ssh_binary_reports_error() {
        let probe = SystemProbe::new("ping", "/nonexistent/ssh-binary");
        let check = probe
            .test_connection(&NasEndpoint::new("nas", "u"), Duration::from_secs(1))
            .await;
        assert!(!check.ok);
        assert!(check.message.starts_with("SSH test error:"));
    }

    #[cfg(unix)]
    mod scripted {
        use std::os::unix::fs::PermissionsExt;
        use std::path::Path;

        use super::*;

        fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
            let path = dir.join(name);
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[tokio::test]
        async fn test_ping_exit_code_decides_reachability() {
            let dir = tempfile::tempdir().unwrap();
            let up = write_script(dir.path(), "ping-up", "exit 0");
            let down = write_script(dir.path(), "ping-down", "exit 1");

            let timeout = Duration::from_secs(1);
            assert!(SystemProbe::new(&up, "ssh").is_reachable("nas", timeout).await);
            assert!(!SystemProbe::new(&down, "ssh").is_reachable("nas", timeout).await);
        }

        #[tokio::test]
        async fn test_ssh_success() {
            let dir = tempfile::tempdir().unwrap();
            let ssh = write_script(dir.path(), "ssh", "echo 'Connection successful'");

            let check = SystemProbe::new("ping", &ssh)
                .test_connection(&NasEndpoint::new("nas", "u"), Duration::from_secs(2))
                .await;
            assert_eq!(check, ConnectionCheck::success("SSH connection successful"));
        }

        #[tokio::test]
        async fn test_ssh_failure_carries_stderr_verbatim() {
            let dir = tempfile::tempdir().unwrap();
            let ssh = write_script(
                dir.path(),
                "ssh",
                "echo 'u@nas: Permission denied (publickey).' >&2\nexit 255",
            );

            let check = SystemProbe::new("ping", &ssh)
                .test_connection(&NasEndpoint::new("nas", "u"), Duration::from_secs(2))
                .await;
            assert!(!check.ok);
            assert_eq!(
                check.message,
                "SSH connection failed: u@nas: Permission denied (publickey)."
            );
        }

        #[tokio::test]
        async fn test_ssh_failure_without_stderr() {
            let dir = tempfile::tempdir().unwrap();
            let ssh = write_script(dir.path(), "ssh", "exit 1");

            let check = SystemProbe::new("ping", &ssh)
                .test_connection(&NasEndpoint::new("nas", "u"), Duration::from_secs(2))
                .await;
            assert_eq!(check.message, "SSH connection failed: Unknown SSH error");
        }
    }
}
