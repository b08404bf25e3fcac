//! Scheduler setting
//!
//! Persisted singleton controlling the unattended interval sync.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Interval used when nothing has been saved yet
pub const DEFAULT_INTERVAL_MINUTES: u32 = 15;

/// Whether the interval job is installed, and how often it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerSetting {
    pub enabled: bool,
    pub interval_minutes: u32,
}

impl SchedulerSetting {
    pub fn new(enabled: bool, interval_minutes: u32) -> Self {
        Self {
            enabled,
            interval_minutes,
        }
    }

    /// Firing interval, clamped to at least one minute
    pub fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval_minutes.max(1)) * 60)
    }
}

impl Default for SchedulerSetting {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_setting() {
        let setting = SchedulerSetting::default();
        assert!(setting.enabled);
        assert_eq!(setting.interval_minutes, 15);
        assert_eq!(setting.interval(), Duration::from_secs(900));
    }

    #[test]
    fn test_interval_clamped_to_one_minute() {
        let setting = SchedulerSetting::new(true, 0);
        assert_eq!(setting.interval(), Duration::from_secs(60));
    }
}
