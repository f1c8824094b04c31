//! Archiving of completed tasks and the background sweep that runs it.
//!
//! The sweep is a single store transaction, so it serializes against the
//! foreground session through the store's lock. The scheduler never touches
//! UI state; the session picks up the change on its next refresh.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::ArchiveConfig;
use crate::error::Result;
use crate::model::Task;
use crate::store::{Store, is_archivable};

/// Tasks a sweep at `now` would archive
pub fn candidates(store: &Store, max_age: chrono::Duration, now: DateTime<Utc>) -> Result<Vec<Task>> {
    let cutoff = now - max_age;
    store.read(|db| {
        db.tasks
            .iter()
            .filter(|t| is_archivable(t, cutoff))
            .cloned()
            .collect()
    })
}

/// Archive every task completed more than `max_age` before `now`
pub fn sweep(store: &Store, max_age: chrono::Duration, now: DateTime<Utc>) -> Result<usize> {
    let cutoff = now - max_age;
    let archived = store.archive_completed_before(cutoff)?;
    if archived > 0 {
        tracing::info!(archived, %cutoff, "archived completed tasks");
    } else {
        tracing::debug!(%cutoff, "nothing to archive");
    }
    Ok(archived)
}

/// Timing for the background sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    /// Time between sweeps
    pub interval: Duration,
    /// Granularity of the wait, bounds how late cancellation is noticed
    pub step: Duration,
    pub max_age: chrono::Duration,
    pub shutdown_timeout: Duration,
}

impl Schedule {
    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self {
            interval: config.interval(),
            step: Duration::from_secs(60),
            max_age: config.max_age(),
            shutdown_timeout: config.shutdown_timeout(),
        }
    }
}

/// Periodic archive sweep on the tokio runtime
pub struct ArchiveScheduler {
    cancel: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
    completed: Arc<AtomicUsize>,
    shutdown_timeout: Duration,
}

impl ArchiveScheduler {
    /// Spawn the sweep loop. Must be called from within a tokio runtime.
    pub fn start(store: Store, schedule: Schedule) -> Self {
        let (cancel, cancelled) = watch::channel(false);
        let completed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&completed);
        tracing::info!(
            interval_secs = schedule.interval.as_secs(),
            "starting archive scheduler"
        );
        let handle = tokio::spawn(run(store, schedule, cancelled, counter));
        Self {
            cancel,
            handle: Some(handle),
            completed,
            shutdown_timeout: schedule.shutdown_timeout,
        }
    }

    /// Number of sweeps that have finished, successful or not
    pub fn sweeps_completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Cancel the loop and wait for it, at most the configured timeout. A
    /// loop that does not stop in time is aborted. Returns true on a clean
    /// stop.
    pub async fn shutdown(mut self) -> bool {
        let _ = self.cancel.send(true);
        let Some(handle) = self.handle.take() else {
            return true;
        };
        let abort = handle.abort_handle();
        match tokio::time::timeout(self.shutdown_timeout, handle).await {
            Ok(Ok(())) => {
                tracing::info!("archive scheduler stopped");
                true
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "archive scheduler ended abnormally");
                false
            }
            Err(_) => {
                abort.abort();
                tracing::warn!(
                    timeout_ms = self.shutdown_timeout.as_millis() as u64,
                    "archive scheduler did not stop in time; aborted"
                );
                false
            }
        }
    }
}

/// Stop the scheduler, then the runtime it runs on. A sweep still blocked
/// in the store (for example waiting on another process's file lock) is
/// left behind after `timeout` instead of holding up exit. Returns true
/// when everything stopped cleanly.
pub fn shutdown_runtime(
    runtime: tokio::runtime::Runtime,
    scheduler: Option<ArchiveScheduler>,
    timeout: Duration,
) -> bool {
    let clean = match scheduler {
        Some(scheduler) => runtime.block_on(scheduler.shutdown()),
        None => true,
    };
    runtime.shutdown_timeout(timeout);
    clean
}

impl Drop for ArchiveScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.cancel.send(true);
            handle.abort();
        }
    }
}

async fn run(
    store: Store,
    schedule: Schedule,
    mut cancelled: watch::Receiver<bool>,
    completed: Arc<AtomicUsize>,
) {
    loop {
        if *cancelled.borrow() {
            return;
        }
        run_sweep(&store, schedule.max_age).await;
        completed.fetch_add(1, Ordering::SeqCst);

        let mut waited = Duration::ZERO;
        while waited < schedule.interval {
            let step = schedule.step.min(schedule.interval - waited);
            tokio::select! {
                _ = tokio::time::sleep(step) => waited += step,
                changed = cancelled.changed() => {
                    if changed.is_err() || *cancelled.borrow() {
                        tracing::debug!("archive scheduler cancelled");
                        return;
                    }
                }
            }
        }
    }
}

async fn run_sweep(store: &Store, max_age: chrono::Duration) {
    let store = store.clone();
    let result = tokio::task::spawn_blocking(move || sweep(&store, max_age, Utc::now())).await;
    match result {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "archive sweep failed"),
        Err(e) => tracing::warn!(error = %e, "archive sweep panicked"),
    }
}
