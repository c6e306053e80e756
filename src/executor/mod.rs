//! Bounded-concurrency execution of a frozen job list.
//!
//! A fixed number of scoped worker threads pull jobs from a shared queue. Each
//! worker reports `(index, success)` to a single collector, so every job gets
//! exactly one result slot and no result is ever written twice. A job that
//! fails (or panics) only affects its own slot.

use crate::job::{Job, JobResult};
use anyhow::{Result, anyhow};
use parking_lot::Mutex;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Default number of downloads running at once.
pub const DEFAULT_WORKERS: usize = 4;

/// Performs the work of a single job.
pub trait Fetcher: Sync {
    /// Download one job.
    ///
    /// # Errors
    ///
    /// Any error marks this job as failed; other jobs are unaffected.
    fn fetch(&self, job: &Job) -> Result<()>;
}

/// Receives progress events from worker threads.
pub trait Observer: Sync {
    /// A worker picked up `job`.
    fn started(&self, _job: &Job) {}

    /// `job` completed; `error` is set when it failed.
    fn finished(&self, _job: &Job, _error: Option<&anyhow::Error>) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Observer for Silent {}

/// Runs jobs with at most `workers` in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Executor {
    workers: usize,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl Executor {
    /// Create an executor; a cap of zero is raised to one.
    #[must_use]
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Concurrency cap.
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Run every job and return one result per job, in submission order.
    ///
    /// Blocks until all jobs have finished. Completion order is unspecified.
    pub fn run<F, O>(&self, jobs: &[Job], fetcher: &F, observer: &O) -> Vec<JobResult>
    where
        F: Fetcher + ?Sized,
        O: Observer + ?Sized,
    {
        if jobs.is_empty() {
            return Vec::new();
        }

        let started = Instant::now();
        let worker_count = self.workers.min(jobs.len());
        info!(jobs = jobs.len(), workers = worker_count, "Starting batch");

        let queue = Mutex::new(jobs.iter().enumerate());
        let (tx, rx) = mpsc::channel::<(usize, bool)>();

        std::thread::scope(|scope| {
            for worker in 0..worker_count {
                let tx = tx.clone();
                let queue = &queue;
                scope.spawn(move || {
                    loop {
                        let next = queue.lock().next();
                        let Some((index, job)) = next else {
                            break;
                        };
                        let success = run_job(fetcher, observer, job, worker);
                        if tx.send((index, success)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(tx);

        let mut slots: Vec<Option<bool>> = vec![None; jobs.len()];
        for (index, success) in rx {
            if let Some(slot) = slots.get_mut(index) {
                *slot = Some(success);
            }
        }

        let results: Vec<JobResult> = jobs
            .iter()
            .zip(slots)
            .map(|(job, slot)| {
                if slot.is_none() {
                    warn!(job = %job.id(), "Job produced no result; counting as failed");
                }
                JobResult {
                    id: job.id(),
                    success: slot.unwrap_or(false),
                }
            })
            .collect();

        let succeeded = results.iter().filter(|r| r.success).count();
        info!(
            succeeded,
            failed = results.len() - succeeded,
            elapsed_ms = started.elapsed().as_millis(),
            "Batch finished"
        );
        results
    }
}

/// Run one job, converting errors and panics into a failed result.
fn run_job<F, O>(fetcher: &F, observer: &O, job: &Job, worker: usize) -> bool
where
    F: Fetcher + ?Sized,
    O: Observer + ?Sized,
{
    let started = Instant::now();
    debug!(worker, job = %job.id(), method = job.method.label(), "Job started");

    observer.started(job);
    let outcome = catch_unwind(AssertUnwindSafe(|| fetcher.fetch(job)))
        .unwrap_or_else(|payload| Err(anyhow!("job panicked: {}", panic_message(payload.as_ref()))));
    observer.finished(job, outcome.as_ref().err());

    match outcome {
        Ok(()) => {
            debug!(
                worker,
                job = %job.id(),
                elapsed_ms = started.elapsed().as_millis(),
                "Job succeeded"
            );
            true
        }
        Err(e) => {
            warn!(worker, job = %job.id(), error = %e, "Job failed");
            false
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
