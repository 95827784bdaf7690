//! # Task Management System
//!
//! A frame-budgeted work queue. Expensive work (chunk generation) is published
//! as a [`Task`] instead of being run inline, and the main loop drains the
//! queue a little every frame so a burst of new chunks never stalls rendering.
//!
//! ## Task Lifecycle
//! 1. Tasks are published with a [`CancellationToken`] via `TaskManager::publish_task()`
//! 2. Each frame, `process_queued_tasks()` runs tasks in FIFO order until the
//!    time budget is spent. At least one task runs per call so the queue
//!    always makes progress.
//! 3. A task whose token was cancelled before it ran is dropped without running
//! 4. Follow-up tasks returned by a task join the back of the queue
//!
//! ## Example Usage
//! ```
//! use std::time::Duration;
//! use voxel_sandbox::engine_state::task_management::{
//!     task::Task, CancellationToken, TaskManager,
//! };
//!
//! struct Add(u32);
//!
//! impl Task<u32> for Add {
//!     fn process(self: Box<Self>, total: &mut u32) -> Vec<Box<dyn Task<u32>>> {
//!         *total += self.0;
//!         Vec::new()
//!     }
//! }
//!
//! let mut task_manager: TaskManager<u32> = TaskManager::new();
//! let skipped = CancellationToken::new();
//! task_manager.publish_task(Box::new(Add(2)), CancellationToken::new());
//! task_manager.publish_task(Box::new(Add(40)), skipped.clone());
//! skipped.cancel();
//!
//! let mut total = 0;
//! while !task_manager.is_empty() {
//!     task_manager.process_queued_tasks(&mut total, Duration::from_millis(4));
//! }
//! assert_eq!(total, 2);
//! ```

pub mod task;

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use log::debug;
use task::Task;
use web_time::Instant;

/// Shared flag that tells the queue to skip a task that has not run yet.
///
/// Clones observe the same flag. Cancelling after the task ran has no effect.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

struct QueuedTask<C> {
    task: Box<dyn Task<C>>,
    token: CancellationToken,
}

/// FIFO queue of deferred tasks, drained under a per-call time budget.
pub struct TaskManager<C> {
    queued_tasks: VecDeque<QueuedTask<C>>,
}

impl<C> Default for TaskManager<C> {
    fn default() -> Self {
        Self {
            queued_tasks: VecDeque::new(),
        }
    }
}

impl<C> TaskManager<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a task behind everything already waiting.
    ///
    /// # Arguments
    /// * `task` - The work to run
    /// * `token` - Cancelling this token before the task runs skips it
    pub fn publish_task(&mut self, task: Box<dyn Task<C>>, token: CancellationToken) {
        self.queued_tasks.push_back(QueuedTask { task, token });
    }

    /// Number of tasks waiting, cancelled ones included.
    pub fn len(&self) -> usize {
        self.queued_tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued_tasks.is_empty()
    }

    /// Drops every waiting task without running it.
    pub fn clear(&mut self) {
        self.queued_tasks.clear();
    }

    /// Runs queued tasks until the queue is empty or `budget` has elapsed.
    ///
    /// # Arguments
    /// * `context` - State handed to each task
    /// * `budget` - Wall-clock time allowed for this call. The first live task
    ///   always runs, even with a zero budget.
    ///
    /// # Returns
    /// The number of tasks that actually ran.
    pub fn process_queued_tasks(&mut self, context: &mut C, budget: Duration) -> usize {
        let start = Instant::now();
        let mut processed = 0;

        while let Some(QueuedTask { task, token }) = self.queued_tasks.pop_front() {
            if token.is_cancelled() {
                debug!("Skipping cancelled {}", task.describe());
                continue;
            }

            let follow_ups = task.process(context);
            processed += 1;
            for follow_up in follow_ups {
                self.queued_tasks.push_back(QueuedTask {
                    task: follow_up,
                    token: token.clone(),
                });
            }

            if start.elapsed() >= budget {
                break;
            }
        }

        processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Vec<&'static str>;

    struct Record(&'static str);

    impl Task<Log> for Record {
        fn process(self: Box<Self>, log: &mut Log) -> Vec<Box<dyn Task<Log>>> {
            log.push(self.0);
            Vec::new()
        }
    }

    struct Spawn;

    impl Task<Log> for Spawn {
        fn process(self: Box<Self>, log: &mut Log) -> Vec<Box<dyn Task<Log>>> {
            log.push("spawn");
            vec![Box::new(Record("child"))]
        }
    }

    #[test]
    fn runs_in_fifo_order_and_skips_cancelled_tasks() {
        let mut manager: TaskManager<Log> = TaskManager::new();
        let cancelled = CancellationToken::new();
        manager.publish_task(Box::new(Record("a")), CancellationToken::new());
        manager.publish_task(Box::new(Record("b")), cancelled.clone());
        manager.publish_task(Box::new(Record("c")), CancellationToken::new());
        cancelled.cancel();

        let mut log = Vec::new();
        let processed = manager.process_queued_tasks(&mut log, Duration::from_secs(60));

        assert_eq!(processed, 2);
        assert_eq!(log, vec!["a", "c"]);
        assert!(manager.is_empty());
    }

    #[test]
    fn a_zero_budget_still_makes_progress() {
        let mut manager: TaskManager<Log> = TaskManager::new();
        manager.publish_task(Box::new(Record("a")), CancellationToken::new());
        manager.publish_task(Box::new(Record("b")), CancellationToken::new());

        let mut log = Vec::new();
        assert_eq!(manager.process_queued_tasks(&mut log, Duration::ZERO), 1);
        assert_eq!(log, vec!["a"]);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn follow_ups_queue_behind_existing_work() {
        let mut manager: TaskManager<Log> = TaskManager::new();
        manager.publish_task(Box::new(Spawn), CancellationToken::new());
        manager.publish_task(Box::new(Record("next")), CancellationToken::new());

        let mut log = Vec::new();
        manager.process_queued_tasks(&mut log, Duration::from_secs(60));

        assert_eq!(log, vec!["spawn", "next", "child"]);
    }

    #[test]
    fn clones_share_the_cancellation_flag() {
        let token = CancellationToken::new();
        let clone = token.clone();

        clone.cancel();

        assert!(token.is_cancelled());
    }
}
