//! Fixed-size worker pool with per-task result handles

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use log::debug;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;
use thiserror::Error;

/// Failure to obtain a task's value
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task panicked: {0}")]
    Panicked(String),

    #[error("task ended without producing a result")]
    Disconnected,

    #[error("task did not finish within {0:?}")]
    TimedOut(Duration),
}

/// Failure to build the pool
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("worker pool needs at least one thread")]
    NoWorkers,

    #[error("cannot start worker threads: {0}")]
    Build(#[from] rayon::ThreadPoolBuildError),
}

/// Receiving end of one submitted job
///
/// Yields exactly one value.
#[derive(Debug)]
pub struct TaskHandle<T> {
    receiver: Receiver<Result<T, TaskError>>,
}

impl<T> TaskHandle<T> {
    /// Blocks until the job has finished
    pub fn wait(self) -> Result<T, TaskError> {
        self.receiver.recv().map_err(|_| TaskError::Disconnected)?
    }

    /// Blocks for at most `timeout`
    ///
    /// A timed-out handle can be waited on again.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<T, TaskError> {
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(TaskError::TimedOut(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(TaskError::Disconnected),
        }
    }
}

/// Runs jobs on a fixed number of named OS threads
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Result<Self, PoolError> {
        if workers == 0 {
            return Err(PoolError::NoWorkers);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("gridpoints-worker-{}", i))
            .build()?;
        debug!("Started {} worker threads", workers);

        Ok(WorkerPool { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Queues `job`; a panic inside it becomes [`TaskError::Panicked`]
    pub fn submit<T, F>(&self, job: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (sender, receiver) = bounded(1);

        self.pool.spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(job))
                .map_err(|payload| TaskError::Panicked(panic_message(payload)));
            // The handle may already be gone; nothing waits for this value then.
            let _ = sender.send(result);
        });

        TaskHandle { receiver }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
