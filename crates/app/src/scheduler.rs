//! Cooperative in-process scheduler.
//!
//! Jobs are tokio tasks tracked by [`JobId`]. A recurring job sleeps until
//! the next occurrence of its cron expression and spawns the callback as an
//! independent task, so a slow callback never delays the following fire.
//! One-shot jobs run their callback once after a delay and are the building
//! block for re-scheduled continuations such as status polling.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use fleethub_domain::automation::CronExpression;
use fleethub_domain::time::{self, Timestamp};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Handle identifying a scheduled job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(u64);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Wall clock advanced by the tokio clock.
///
/// Cron occurrences are computed against wall time, but sleeping happens on
/// the tokio clock. Anchoring one to the other keeps both in step, including
/// when the tokio clock is paused and advanced manually.
#[derive(Debug, Clone, Copy)]
struct Clock {
    wall: Timestamp,
    instant: Instant,
}

impl Clock {
    fn anchored_now() -> Self {
        Self {
            wall: time::now(),
            instant: Instant::now(),
        }
    }

    fn now(&self) -> Timestamp {
        let elapsed =
            chrono::Duration::from_std(self.instant.elapsed()).unwrap_or(chrono::Duration::zero());
        time::now().max(self.wall + elapsed)
    }
}

/// Shared handle to the job table. Cloning is cheap.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

struct Inner {
    clock: Clock,
    next_id: AtomicU64,
    jobs: Mutex<HashMap<JobId, JoinHandle<()>>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("active_jobs", &self.active_jobs())
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                clock: Clock::anchored_now(),
                next_id: AtomicU64::new(1),
                jobs: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Current wall time as seen by scheduled jobs.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.inner.clock.now()
    }

    /// Run `callback` at every occurrence of `cron` until the job is
    /// cancelled.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule_recurring<F, Fut>(&self, cron: CronExpression, callback: F) -> JobId
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_job_id();
        let clock = self.inner.clock;
        let handle = tokio::spawn(async move {
            let mut cursor = clock.now();
            loop {
                let Some(next) = cron.next_after(&cursor) else {
                    tracing::warn!(
                        job = %id,
                        expression = %cron,
                        "cron expression has no further occurrence"
                    );
                    break;
                };
                tokio::time::sleep(time::delay_until(clock.now(), next)).await;
                cursor = clock.now().max(next);
                tracing::trace!(job = %id, fired_for = %next, "recurring job fired");
                tokio::spawn(callback());
            }
        });
        self.track(id, handle);
        id
    }

    /// Run `callback` once after `delay`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule_once_after<F, Fut>(&self, delay: Duration, callback: F) -> JobId
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_job_id();
        let handle = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            callback().await;
        });
        self.track(id, handle);
        id
    }

    /// Stop a job. Returns `false` when the job was unknown or had already
    /// finished; calling it twice is harmless.
    pub fn cancel(&self, id: JobId) -> bool {
        let Some(handle) = self.jobs().remove(&id) else {
            return false;
        };
        let was_running = !handle.is_finished();
        handle.abort();
        tracing::debug!(job = %id, was_running, "job cancelled");
        was_running
    }

    #[must_use]
    pub fn is_active(&self, id: JobId) -> bool {
        self.jobs()
            .get(&id)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Number of jobs that are scheduled and not yet finished.
    #[must_use]
    pub fn active_jobs(&self) -> usize {
        self.jobs()
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Cancel every job.
    pub fn shutdown(&self) {
        let drained: Vec<_> = self.jobs().drain().collect();
        for (_, handle) in &drained {
            handle.abort();
        }
        tracing::debug!(jobs = drained.len(), "scheduler shut down");
    }

    fn next_job_id(&self) -> JobId {
        JobId(self.inner.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn track(&self, id: JobId, handle: JoinHandle<()>) {
        let mut jobs = self.jobs();
        jobs.retain(|_, handle| !handle.is_finished());
        jobs.insert(id, handle);
    }

    fn jobs(&self) -> std::sync::MutexGuard<'_, HashMap<JobId, JoinHandle<()>>> {
        self.inner
            .jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
