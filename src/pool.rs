// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Managed worker pool for completion handlers
//!
//! Handlers are plain blocking closures. They run on tokio's blocking
//! threads, at most `size` at a time. Errors and panics escaping a job go to
//! the pool's error sink instead of the caller.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use tokio::sync::Semaphore;

use crate::error::{Error, Result};

/// Receiver for errors no caller is left to handle
pub type ErrorSink = Arc<dyn Fn(Error) + Send + Sync>;

/// Sink that logs at error level
pub fn log_sink() -> ErrorSink {
    Arc::new(|err: Error| {
        tracing::error!(error = %err, "uncaught error in worker pool");
    })
}

/// Pool statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Jobs handed to the pool
    pub submitted: u64,
    /// Jobs that finished without error
    pub completed: u64,
    /// Jobs that returned an error or panicked
    pub failed: u64,
    /// Jobs currently running
    pub active: u64,
    /// Peak concurrent jobs
    pub peak_active: u64,
    /// Total wait time for a free worker (ms)
    pub total_wait_ms: u64,
}

/// Fixed-size pool running completion handlers
#[derive(Clone)]
pub struct WorkerPool {
    size: usize,
    semaphore: Arc<Semaphore>,
    sink: ErrorSink,
    stats: Arc<RwLock<PoolStats>>,
}

impl WorkerPool {
    /// Create a pool with `size` workers (at least one) and the logging sink
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            semaphore: Arc::new(Semaphore::new(size)),
            sink: log_sink(),
            stats: Arc::new(RwLock::new(PoolStats::default())),
        }
    }

    /// Replace the error sink
    pub fn with_error_sink(mut self, sink: ErrorSink) -> Self {
        self.sink = sink;
        self
    }

    /// Run a job on a worker and wait for it to finish.
    ///
    /// Must be awaited inside a tokio runtime.
    pub async fn run<F>(&self, job: F)
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        let start = Instant::now();
        self.stats.write().submitted += 1;

        let permit = match self.semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                self.stats.write().failed += 1;
                self.report(Error::other("worker pool closed"));
                return;
            }
        };

        {
            let mut stats = self.stats.write();
            stats.total_wait_ms += start.elapsed().as_millis() as u64;
            stats.active += 1;
            if stats.active > stats.peak_active {
                stats.peak_active = stats.active;
            }
        }

        let joined = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await;

        let failure = match joined {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(err),
            Err(join_err) => Some(Error::other(format!("worker job panicked: {}", join_err))),
        };

        {
            let mut stats = self.stats.write();
            stats.active = stats.active.saturating_sub(1);
            if failure.is_some() {
                stats.failed += 1;
            } else {
                stats.completed += 1;
            }
        }

        if let Some(err) = failure {
            self.report(err);
        }
    }

    /// Send an error to the sink
    pub fn report(&self, err: Error) {
        (self.sink)(err);
    }

    /// Number of workers
    pub fn size(&self) -> usize {
        self.size
    }

    /// Snapshot of pool statistics
    pub fn stats(&self) -> PoolStats {
        self.stats.read().clone()
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.size)
            .field("stats", &self.stats())
            .finish()
    }
}
