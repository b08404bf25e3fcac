//! rsync adapter for the transfer tool port
//!
//! One mapping is mirrored by one `rsync` invocation over SSH. The
//! tool's `--stats` report is parsed by [`parse_transfer_output`], a pure
//! function that never fails: a missing figure reads as zero.

use std::path::PathBuf;
use std::process::Stdio;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::process::Command;
use tracing::{debug, error, info};

use nassync_core::domain::{FolderMapping, NasEndpoint, TransferStats};
use nassync_core::ports::{ITransferTool, TransferOutcome};

use crate::SyncError;

static SENT_BYTES: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"sent ([\d,]+) bytes").ok());

static FILES_TRANSFERRED: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"Number of regular files transferred: ([\d,]+)").ok());

/// Extracts transfer statistics from an rsync `--stats` report
///
/// Thousands separators are stripped. Figures that are absent or do not
/// fit a `u64` are reported as zero.
pub fn parse_transfer_output(output: &str) -> TransferStats {
    TransferStats {
        files_transferred: capture_number(FILES_TRANSFERRED.as_ref(), output),
        bytes_transferred: capture_number(SENT_BYTES.as_ref(), output),
    }
}

fn capture_number(pattern: Option<&Regex>, output: &str) -> u64 {
    pattern
        .and_then(|re| re.captures(output))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
        .unwrap_or(0)
}

/// Makes rsync copy the contents of `source` rather than the directory itself
pub fn normalize_source(source: &str) -> String {
    format!("{}/", source.trim_end_matches('/'))
}

/// [`ITransferTool`] implementation invoking `rsync` with an SSH transport
#[derive(Debug, Clone)]
pub struct RsyncTransfer {
    rsync: PathBuf,
    ssh: PathBuf,
}

impl Default for RsyncTransfer {
    fn default() -> Self {
        Self::new("rsync", "ssh")
    }
}

impl RsyncTransfer {
    pub fn new(rsync: impl Into<PathBuf>, ssh: impl Into<PathBuf>) -> Self {
        Self {
            rsync: rsync.into(),
            ssh: ssh.into(),
        }
    }

    /// Full argument list for mirroring `mapping` onto `endpoint`
    pub fn build_args(&self, mapping: &FolderMapping, endpoint: &NasEndpoint) -> Vec<String> {
        let transport = format!(
            "{} -i {} -p {} -o StrictHostKeyChecking=accept-new",
            self.ssh.display(),
            endpoint.ssh_key_path.display(),
            endpoint.ssh_port
        );

        let mut args = vec![
            "-avz".to_string(),
            "--stats".to_string(),
            "--progress".to_string(),
            "-e".to_string(),
            transport,
        ];

        // rsync removes a source file only after it was transferred
        if mapping.delete_source {
            args.push("--remove-source-files".to_string());
        }

        args.push(normalize_source(&mapping.source_path));
        args.push(endpoint.remote_target(&mapping.destination_path));
        args
    }

    async fn run(
        &self,
        mapping: &FolderMapping,
        endpoint: &NasEndpoint,
    ) -> Result<std::process::Output, SyncError> {
        Command::new(&self.rsync)
            .args(self.build_args(mapping, endpoint))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| SyncError::ToolLaunch {
                tool: self.rsync.display().to_string(),
                source,
            })
    }
}

#[async_trait::async_trait]
impl ITransferTool for RsyncTransfer {
    async fn transfer(
        &self,
        mapping: &FolderMapping,
        endpoint: &NasEndpoint,
    ) -> anyhow::Result<TransferOutcome> {
        info!(
            mapping_id = %mapping.id,
            source = %mapping.source_path,
            destination = %mapping.destination_path,
            delete_source = mapping.delete_source,
            "Running rsync"
        );

        let output = match self.run(mapping, endpoint).await {
            Ok(output) => output,
            Err(e) => {
                error!(mapping_id = %mapping.id, error = %e, "rsync could not be started");
                return Ok(TransferOutcome::failure(format!("Rsync error: {}", e)));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);

        if output.status.success() {
            let stats = parse_transfer_output(&stdout);
            debug!(
                mapping_id = %mapping.id,
                files = stats.files_transferred,
                bytes = stats.bytes_transferred,
                "rsync finished"
            );
            return Ok(TransferOutcome::success(
                "Sync completed successfully",
                stats,
            ));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = [stderr.trim(), stdout.trim()]
            .into_iter()
            .find(|text| !text.is_empty())
            .unwrap_or("Unknown rsync error");

        error!(
            mapping_id = %mapping.id,
            exit_code = ?output.status.code(),
            "rsync failed"
        );
        Ok(TransferOutcome::failure(format!("Rsync failed: {}", detail)))
    }
}

#[cfg(test)]
mod tests {
    use nassync_core::domain::MappingId;

    use super::*;

    const STATS_REPORT: &str = "\
sending incremental file list
photo.jpg
        1,024 100%    0.00kB/s    0:00:00 (xfr#1, to-chk=0/2)

Number of files: 2 (reg: 1, dir: 1)
Number of created files: 1 (reg: 1)
Number of deleted files: 0
Number of regular files transferred: 5
Total file size: 1,024 bytes
Total transferred file size: 1,024 bytes

sent 1,234 bytes  received 35 bytes  2,538.00 bytes/sec
total size is 1,024  speedup is 0.81
";

    fn mapping(delete_source: bool) -> FolderMapping {
        FolderMapping {
            id: MappingId::new(7),
            name: "Photos".into(),
            source_path: "/data/photos/".into(),
            destination_path: "/volume1/photos".into(),
            enabled: true,
            delete_source,
            last_sync_at: None,
            last_sync_status: None,
            last_sync_message: None,
            created_at: None,
        }
    }

    #[test]
    fn test_parse_full_report() {
        let stats = parse_transfer_output(STATS_REPORT);
        assert_eq!(stats, TransferStats::new(5, 1234));
    }

    #[test]
    fn test_parse_missing_patterns_yield_zero() {
        assert_eq!(parse_transfer_output(""), TransferStats::default());
        assert_eq!(
            parse_transfer_output("rsync: nothing to report"),
            TransferStats::default()
        );
        assert_eq!(
            parse_transfer_output("sent 500 bytes  received 12 bytes"),
            TransferStats::new(0, 500)
        );
    }

    #[test]
    fn test_parse_overflowing_figure_is_zero() {
        let stats = parse_transfer_output("sent 99,999,999,999,999,999,999,999 bytes");
        assert_eq!(stats.bytes_transferred, 0);
    }

    #[test]
    fn test_normalize_source() {
        assert_eq!(normalize_source("/data/photos"), "/data/photos/");
        assert_eq!(normalize_source("/data/photos///"), "/data/photos/");
        assert_eq!(normalize_source("/"), "/");
    }

    #[test]
    fn test_build_args() {
        let tool = RsyncTransfer::default();
        let endpoint = NasEndpoint::new("nas.local", "backup")
            .with_key_path("/keys/id")
            .with_port(2222);

        let args = tool.build_args(&mapping(false), &endpoint);
        assert_eq!(
            args,
            vec![
                "-avz",
                "--stats",
                "--progress",
                "-e",
                "ssh -i /keys/id -p 2222 -o StrictHostKeyChecking=accept-new",
                "/data/photos/",
                "backup@nas.local:/volume1/photos",
            ]
        );

        let args = tool.build_args(&mapping(true), &endpoint);
        assert!(args.contains(&"--remove-source-files".to_string()));
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_failed_outcome() {
        let tool = RsyncTransfer::new("/nonexistent/rsync-binary", "ssh");
        let outcome = tool
            .transfer(&mapping(false), &NasEndpoint::new("nas", "u"))
            .await
            .unwrap();
        assert!(!outcome.success);
        assert!(outcome.message.starts_with("Rsync error:"));
        assert_eq!(outcome.stats, TransferStats::default());
    }

    #[cfg(unix)]
    mod scripted {
        use std::os::unix::fs::PermissionsExt;
        use std::path::Path;

        use super::*;

        fn write_script(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("rsync");
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        async fn run_with(body: &str) -> TransferOutcome {
            let dir = tempfile::tempdir().unwrap();
            let rsync = write_script(dir.path(), body);
            RsyncTransfer::new(rsync, "ssh")
                .transfer(&mapping(false), &NasEndpoint::new("nas", "u"))
                .await
                .unwrap()
        }

        #[tokio::test]
        async fn test_success_parses_stats() {
            let outcome = run_with(
                "echo 'Number of regular files transferred: 2'\necho 'sent 500 bytes  received 20 bytes'",
            )
            .await;
            assert_eq!(
                outcome,
                TransferOutcome::success("Sync completed successfully", TransferStats::new(2, 500))
            );
        }

        #[tokio::test]
        async fn test_success_without_stats_still_succeeds() {
            let outcome = run_with("exit 0").await;
            assert!(outcome.success);
            assert_eq!(outcome.stats, TransferStats::default());
        }

        #[tokio::test]
        async fn test_failure_prefers_stderr() {
            let outcome = run_with("echo 'partial' \necho 'rsync error: some files vanished' >&2\nexit 23").await;
            assert!(!outcome.success);
            assert_eq!(outcome.message, "Rsync failed: rsync error: some files vanished");
        }

        #[tokio::test]
        async fn test_failure_falls_back_to_stdout_then_generic() {
            let outcome = run_with("echo 'only stdout'\nexit 1").await;
            assert_eq!(outcome.message, "Rsync failed: only stdout");

            let outcome = run_with("exit 12").await;
            assert_eq!(outcome.message, "Rsync failed: Unknown rsync error");
        }
    }
}
