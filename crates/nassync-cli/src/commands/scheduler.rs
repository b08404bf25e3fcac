//! Scheduler commands - View or change the interval sync
//!
//! The setting is persisted in the store. A running `nassyncd` picks up
//! changes when it receives SIGHUP.

use anyhow::Result;
use clap::Subcommand;
use nassync_core::domain::SchedulerSetting;
use nassync_core::ports::IConfigStore;

use super::AppContext;
use crate::output::{get_formatter, to_json, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum SchedulerCommand {
    /// Show the saved schedule
    Show,
    /// Change the schedule
    Set {
        /// Turn the interval sync on or off
        #[arg(long)]
        enabled: Option<bool>,
        /// Minutes between syncs (minimum 1)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        interval: Option<u32>,
    },
}

impl SchedulerCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        match self {
            SchedulerCommand::Show => {
                let setting = ctx.store.get_scheduler_setting().await?;
                if format.is_json() {
                    formatter.print_json(&to_json(&setting)?);
                } else {
                    println!("Enabled:  {}", if setting.enabled { "yes" } else { "no" });
                    println!("Interval: {} minute(s)", setting.interval_minutes);
                }
            }
            SchedulerCommand::Set { enabled, interval } => {
                let current = ctx.store.get_scheduler_setting().await?;
                let setting = merge(current, *enabled, *interval);
                ctx.store.save_scheduler_setting(&setting).await?;

                if format.is_json() {
                    formatter.print_json(&to_json(&setting)?);
                } else {
                    formatter.success(&format!(
                        "Scheduler {} every {} minute(s)",
                        if setting.enabled { "enabled" } else { "disabled" },
                        setting.interval_minutes
                    ));
                    formatter.info("Send SIGHUP to nassyncd to apply the change");
                }
            }
        }
        Ok(())
    }
}

fn merge(current: SchedulerSetting, enabled: Option<bool>, interval: Option<u32>) -> SchedulerSetting {
    SchedulerSetting::new(
        enabled.unwrap_or(current.enabled),
        interval.unwrap_or(current.interval_minutes),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support;

    #[test]
    fn test_merge_keeps_unset_fields() {
        let current = SchedulerSetting::new(true, 15);
        assert_eq!(merge(current, None, Some(30)), SchedulerSetting::new(true, 30));
        assert_eq!(merge(current, Some(false), None), SchedulerSetting::new(false, 15));
    }

    #[test]
    fn test_interval_must_be_positive() {
        use clap::Parser;

        #[derive(Parser)]
        struct Harness {
            #[command(subcommand)]
            cmd: SchedulerCommand,
        }

        assert!(Harness::try_parse_from(["x", "set", "--interval", "0"]).is_err());
        assert!(Harness::try_parse_from(["x", "set", "--enabled", "false", "--interval", "5"]).is_ok());
    }

    #[tokio::test]
    async fn test_set_persists() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_support::context(&dir).await;

        SchedulerCommand::Set {
            enabled: Some(false),
            interval: Some(60),
        }
        .execute(&ctx, OutputFormat::Json)
        .await
        .unwrap();

        assert_eq!(
            ctx.store.get_scheduler_setting().await.unwrap(),
            SchedulerSetting::new(false, 60)
        );
    }
}
