//! Sync command - Run a sync immediately
//!
//! Provides the `nassync sync [MAPPING_ID]` CLI command which:
//! 1. Without an id, syncs every enabled mapping (RunAll)
//! 2. With an id, syncs that one mapping, enabled or not (RunOne)
//! 3. Prints per-mapping results, or the reason nothing ran
//!
//! The run lock file next to the database is shared with `nassyncd`, so
//! a sync requested while the daemon is mid-run reports it as running.

use anyhow::Result;
use clap::Args;
use nassync_core::domain::MappingId;
use nassync_sync::{RunAllResult, RunOneResult, RunStatus};

use super::AppContext;
use crate::output::{get_formatter, to_json, OutputFormat, OutputFormatter};

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Sync only this mapping
    pub mapping_id: Option<MappingId>,
}

impl SyncCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let engine = ctx.engine();

        match self.mapping_id {
            Some(id) => {
                let result = engine.run_one(id).await;
                if format.is_json() {
                    formatter.print_json(&to_json(&result)?);
                } else {
                    report_one(&result, &*formatter);
                }
                if result.status == RunStatus::Error {
                    anyhow::bail!("Sync of mapping {} did not complete", id);
                }
            }
            None => {
                let result = engine.run_all().await;
                if format.is_json() {
                    formatter.print_json(&to_json(&result)?);
                } else {
                    report_all(&result, &*formatter);
                }
                if result.status == RunStatus::Error {
                    anyhow::bail!("Sync did not start");
                }
                let failed = result.mappings.iter().filter(|m| !m.success).count();
                if failed > 0 {
                    anyhow::bail!("{} mapping(s) failed to sync", failed);
                }
            }
        }

        Ok(())
    }
}

fn report_all(result: &RunAllResult, formatter: &dyn OutputFormatter) {
    if let Some(reason) = &result.reason {
        match result.status {
            RunStatus::Skipped => formatter.warn(&format!("Sync skipped: {}", reason)),
            _ => formatter.error(reason),
        }
        return;
    }

    for mapping in &result.mappings {
        let line = format!("{} (#{})", mapping.name, mapping.id);
        if mapping.success {
            formatter.success(&line);
        } else {
            formatter.error(&format!("{} failed; see 'nassync logs --mapping {}'", line, mapping.id));
        }
    }

    let failed = result.mappings.iter().filter(|m| !m.success).count();
    formatter.info(&format!(
        "{} mapping(s) synced, {} failed",
        result.mappings.len() - failed,
        failed
    ));
    if result.any_synced {
        formatter.info("Post-sync actions executed");
    }
}

fn report_one(result: &RunOneResult, formatter: &dyn OutputFormatter) {
    let name = result.mapping.as_deref().unwrap_or("mapping");
    match (result.status, result.success) {
        (RunStatus::Completed, Some(true)) => formatter.success(&format!("{} synced", name)),
        _ => formatter.error(&format!(
            "{}: {}",
            name,
            result.reason.as_deref().unwrap_or("sync failed")
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        cmd: SyncCommand,
    }

    #[test]
    fn test_mapping_id_is_optional() {
        let all = Harness::try_parse_from(["sync"]).unwrap();
        assert!(all.cmd.mapping_id.is_none());

        let one = Harness::try_parse_from(["sync", "4"]).unwrap();
        assert_eq!(one.cmd.mapping_id, Some(MappingId::new(4)));

        assert!(Harness::try_parse_from(["sync", "abc"]).is_err());
    }

    #[tokio::test]
    async fn test_run_all_without_endpoint_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_support::context(&dir).await;

        let result = ctx.engine().run_all().await;
        assert_eq!(result.status, RunStatus::Error);
        assert_eq!(result.reason.as_deref(), Some("No NAS configuration"));
        assert!(!result.any_synced);
    }
}
