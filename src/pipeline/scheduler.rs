//! Bounded, order-preserving task scheduling
//!
//! The scheduler submits one job per work item to a [`WorkerPool`] and
//! keeps the pending handles in submission order. Once `queue_depth`
//! handles are pending the oldest one is drained into the sink before the
//! next item is submitted, so at most `queue_depth` results are ever held
//! in memory and the sink sees results in exactly the submission order.

use log::{debug, info};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::pipeline::pool::{TaskError, TaskHandle, WorkerPool};

/// Shared stop flag
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What a scheduling run did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    pub submitted: usize,
    /// Submission stopped early because the token was cancelled
    pub cancelled: bool,
}

pub struct Scheduler<'p> {
    pool: &'p WorkerPool,
    queue_depth: usize,
    cancel: CancellationToken,
}

impl<'p> Scheduler<'p> {
    /// `queue_depth` of zero is treated as one
    pub fn new(pool: &'p WorkerPool, queue_depth: usize, cancel: CancellationToken) -> Self {
        Scheduler { pool, queue_depth: queue_depth.max(1), cancel }
    }

    pub fn queue_depth(&self) -> usize {
        self.queue_depth
    }

    /// Runs `task(index, item)` for every item and feeds each result to `sink`
    ///
    /// The sink receives `(index, item, result)` in submission order. A
    /// sink error stops submission, drops the pending handles and is
    /// returned; the jobs already running finish on their own.
    pub fn run<I, T, F, S, E>(&self, items: I, task: F, mut sink: S) -> Result<ScheduleReport, E>
    where
        I: IntoIterator,
        I::Item: Clone + Send + 'static,
        T: Send + 'static,
        F: Fn(usize, I::Item) -> T + Send + Sync + 'static,
        S: FnMut(usize, I::Item, Result<T, TaskError>) -> Result<(), E>,
    {
        let task = Arc::new(task);
        let mut pending: VecDeque<(usize, I::Item, TaskHandle<T>)> = VecDeque::with_capacity(self.queue_depth);
        let mut report = ScheduleReport::default();

        for (index, item) in items.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            if pending.len() >= self.queue_depth {
                if let Some((done, done_item, handle)) = pending.pop_front() {
                    sink(done, done_item, handle.wait())?;
                }
                // The sink may have cancelled while we were blocked.
                if self.cancel.is_cancelled() {
                    report.cancelled = true;
                    break;
                }
            }

            let job_task = Arc::clone(&task);
            let job_item = item.clone();
            let handle = self.pool.submit(move || job_task(index, job_item));
            debug!("Submitted task {} ({} pending)", index, pending.len() + 1);

            pending.push_back((index, item, handle));
            report.submitted += 1;
        }

        if report.cancelled {
            info!("Cancelled: draining {} submitted tasks", pending.len());
        }

        while let Some((done, done_item, handle)) = pending.pop_front() {
            sink(done, done_item, handle.wait())?;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn results_arrive_in_submission_order() {
        let pool = WorkerPool::new(4).unwrap();
        let scheduler = Scheduler::new(&pool, 8, CancellationToken::new());
        let mut seen = Vec::new();

        let report = scheduler.run(0..12u64, |_, item| {
            // Later items finish first
            thread::sleep(Duration::from_millis(24 - 2 * item));
            item * 10
        }, |index, item, result| -> Result<(), ()> {
            assert_eq!(index as u64, item);
            seen.push(result.unwrap());
            Ok(())
        }).unwrap();

        assert_eq!(report, ScheduleReport { submitted: 12, cancelled: false });
        assert_eq!(seen, (0..12).map(|i| i * 10).collect::<Vec<_>>());
    }

    #[test]
    fn pending_handles_never_exceed_queue_depth() {
        let pool = WorkerPool::new(2).unwrap();
        let scheduler = Scheduler::new(&pool, 3, CancellationToken::new());
        let started = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&started);

        scheduler.run(0..20usize, move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        }, |index, _, _| -> Result<(), ()> {
            assert!(started.load(Ordering::SeqCst) <= index + 3);
            Ok(())
        }).unwrap();
    }

    #[test]
    fn panicking_task_yields_an_error_in_its_slot() {
        let pool = WorkerPool::new(2).unwrap();
        let scheduler = Scheduler::new(&pool, 4, CancellationToken::new());
        let mut outcomes = Vec::new();

        scheduler.run(0..5u32, |_, item| {
            if item == 2 {
                panic!("item {} exploded", item);
            }
            item
        }, |_, item, result| -> Result<(), ()> {
            outcomes.push((item, result.is_ok()));
            Ok(())
        }).unwrap();

        assert_eq!(outcomes, vec![(0, true), (1, true), (2, false), (3, true), (4, true)]);
    }

    #[test]
    fn cancellation_stops_submission_and_drains_submitted_tasks() {
        let pool = WorkerPool::new(1).unwrap();
        let cancel = CancellationToken::new();
        let scheduler = Scheduler::new(&pool, 2, cancel.clone());
        let mut drained = Vec::new();

        let report = scheduler.run(0..100usize, |index, _| index, |index, _, _| -> Result<(), ()> {
            drained.push(index);
            if index == 0 {
                cancel.cancel();
            }
            Ok(())
        }).unwrap();

        assert!(report.cancelled);
        assert_eq!(report.submitted, 2);
        assert_eq!(drained, vec![0, 1]);
    }

    #[test]
    fn sink_error_aborts_the_run() {
        let pool = WorkerPool::new(2).unwrap();
        let scheduler = Scheduler::new(&pool, 2, CancellationToken::new());
        let mut calls = 0;

        let result = scheduler.run(0..10usize, |index, _| index, |index, _, _| {
            calls += 1;
            if index == 3 { Err("disk full") } else { Ok(()) }
        });

        assert_eq!(result, Err("disk full"));
        assert_eq!(calls, 4);
    }
}
