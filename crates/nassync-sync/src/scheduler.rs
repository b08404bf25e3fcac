//! Interval scheduler - drives unattended whole-fleet runs
//!
//! The [`IntervalScheduler`] owns at most one recurring job, identified by
//! [`SYNC_JOB_ID`]. The job fires [`SyncEngine::run_all`] every
//! `interval_minutes` while the scheduler is started.
//!
//! ## Lifecycle
//!
//! ```text
//! configure() ──→ job installed / removed (from the saved setting)
//! start()     ──→ timer task spawned for the installed job
//! stop()      ──→ timer task aborted, job kept
//! ```
//!
//! Each tick hands the run to its own task, so a long transfer never
//! delays the next tick; that tick simply finds the engine's gate held
//! and is skipped. A run that panics is logged and the timer keeps going.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use nassync_core::domain::SchedulerSetting;
use nassync_core::ports::IConfigStore;

use crate::engine::SyncEngine;

/// Identity of the single recurring sync job
pub const SYNC_JOB_ID: &str = "nas_sync_job";

/// Snapshot returned by [`IntervalScheduler::status`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulerStatus {
    /// The timer is started
    pub running: bool,
    /// A job is installed
    pub job_active: bool,
    /// Next fire time, absent when no job is installed or the timer is stopped
    pub next_run_time: Option<DateTime<Utc>>,
}

struct Job {
    interval: Duration,
    next_fire: Arc<Mutex<Option<DateTime<Utc>>>>,
    task: Option<JoinHandle<()>>,
}

impl Job {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_fire: Arc::new(Mutex::new(None)),
            task: None,
        }
    }

    fn halt(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        *lock(&self.next_fire) = None;
    }
}

#[derive(Default)]
struct SchedulerInner {
    running: bool,
    job: Option<Job>,
}

/// Reconfigurable interval scheduler for whole-fleet runs
///
/// [`start`](Self::start) and [`configure`](Self::configure) spawn tasks
/// and must be called from within a Tokio runtime.
pub struct IntervalScheduler {
    engine: Arc<SyncEngine>,
    store: Arc<dyn IConfigStore>,
    inner: Mutex<SchedulerInner>,
}

impl IntervalScheduler {
    pub fn new(engine: Arc<SyncEngine>, store: Arc<dyn IConfigStore>) -> Self {
        Self {
            engine,
            store,
            inner: Mutex::new(SchedulerInner::default()),
        }
    }

    /// Re-reads the scheduler setting and installs or removes the job
    pub async fn configure(&self) -> anyhow::Result<SchedulerSetting> {
        let setting = self.store.get_scheduler_setting().await?;
        self.apply(&setting);
        Ok(setting)
    }

    /// Installs or removes the job according to `setting`
    ///
    /// An existing job is replaced, never duplicated.
    pub fn apply(&self, setting: &SchedulerSetting) {
        let mut inner = lock(&self.inner);

        if let Some(mut old) = inner.job.take() {
            old.halt();
        }

        if !setting.enabled {
            info!(job = SYNC_JOB_ID, "Scheduler disabled, job removed");
            return;
        }

        let mut job = Job::new(setting.interval());
        if inner.running {
            job.task = Some(self.spawn_timer(&job));
        }
        info!(
            job = SYNC_JOB_ID,
            interval_minutes = job.interval.as_secs() / 60,
            "Scheduler job installed"
        );
        inner.job = Some(job);
    }

    /// Starts the timer; calling it again has no effect
    pub fn start(&self) {
        let mut inner = lock(&self.inner);
        if inner.running {
            return;
        }
        inner.running = true;

        if let Some(job) = inner.job.as_mut() {
            let task = self.spawn_timer(job);
            job.task = Some(task);
        }
        info!("Scheduler started");
    }

    /// Stops the timer and keeps the job; calling it again has no effect
    pub fn stop(&self) {
        let mut inner = lock(&self.inner);
        if !inner.running {
            return;
        }
        inner.running = false;

        if let Some(job) = inner.job.as_mut() {
            job.halt();
        }
        info!("Scheduler stopped");
    }

    pub fn status(&self) -> SchedulerStatus {
        let inner = lock(&self.inner);
        let next_run_time = match (&inner.job, inner.running) {
            (Some(job), true) => *lock(&job.next_fire),
            _ => None,
        };

        SchedulerStatus {
            running: inner.running,
            job_active: inner.job.is_some(),
            next_run_time,
        }
    }

    fn spawn_timer(&self, job: &Job) -> JoinHandle<()> {
        let engine = Arc::clone(&self.engine);
        let period = job.interval;
        let next_fire = Arc::clone(&job.next_fire);

        // Stamp before spawning so status() is accurate immediately
        *lock(&next_fire) = wall_clock_after(period);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                *lock(&next_fire) = wall_clock_after(period);

                info!(job = SYNC_JOB_ID, "Scheduled sync firing");
                let engine = Arc::clone(&engine);
                tokio::spawn(async move {
                    match tokio::spawn(async move { engine.run_all().await }).await {
                        Ok(result) => debug!(
                            job = SYNC_JOB_ID,
                            status = ?result.status,
                            reason = ?result.reason,
                            "Scheduled sync finished"
                        ),
                        Err(e) => error!(job = SYNC_JOB_ID, error = %e, "Scheduled sync failed"),
                    }
                });
            }
        })
    }
}

impl Drop for IntervalScheduler {
    fn drop(&mut self) {
        if let Some(job) = lock(&self.inner).job.as_mut() {
            job.halt();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn wall_clock_after(period: Duration) -> Option<DateTime<Utc>> {
    let period = chrono::Duration::from_std(period).ok()?;
    Utc::now().checked_add_signed(period)
}
