//! Deferred execution of channel deliveries.
//!
//! A [`Channel`](crate::Channel) never invokes a consumer on the stack of the
//! `put`/`take` call that produced the match. It hands the invocation to a
//! [`Scheduler`], which runs it on a later turn.

use crate::channel::Channel;
use crate::config::Config;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs tasks on a later turn of some execution loop.
///
/// # Contract
///
/// - `schedule` must not run `task` before returning. Channels call it while
///   holding their internal lock.
/// - Tasks run in the order they were scheduled, one at a time.
pub trait Scheduler: Send + Sync {
    /// Queues `task` to run after the current turn completes.
    fn schedule(&self, task: Task);
}

/// Error types for run loop operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RunLoopError {
    /// Tasks were still queued after the allowed number of turns.
    #[error("run loop budget of {budget} turns exhausted with {pending} tasks pending")]
    BudgetExhausted {
        /// The number of turns that were allowed.
        budget: usize,
        /// Tasks still queued when the budget ran out.
        pending: usize,
    },
}

/// Single-threaded cooperative run loop.
///
/// Tasks are queued in FIFO order and executed one per turn by whoever drives
/// the loop (`turn`, `run_until_idle`, `run_with_budget`). Tasks scheduled
/// while a turn is executing are appended to the queue and run on later turns.
///
/// # Example
///
/// ```
/// use chanflow::{Message, RunLoop};
/// use std::sync::Arc;
///
/// let run_loop = Arc::new(RunLoop::new());
/// let channel = run_loop.channel::<u32>();
///
/// channel.put(7);
/// channel.take(|message| assert_eq!(message, Message::Value(7)));
///
/// // Nothing has been delivered yet; delivery happens on a later turn.
/// assert_eq!(run_loop.pending(), 1);
/// run_loop.run_until_idle();
/// ```
#[derive(Default)]
pub struct RunLoop {
    queue: Mutex<VecDeque<Task>>,
    turns: AtomicU64,
}

impl RunLoop {
    /// Creates an empty run loop.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a channel whose deliveries run on this loop.
    pub fn channel<T: Send + 'static>(self: &Arc<Self>) -> Channel<T> {
        Channel::new(Arc::clone(self) as Arc<dyn Scheduler>)
    }

    /// Creates a channel with a custom configuration whose deliveries run on this loop.
    pub fn channel_with_config<T: Send + 'static>(self: &Arc<Self>, config: Config) -> Channel<T> {
        Channel::with_config(Arc::clone(self) as Arc<dyn Scheduler>, config)
    }

    /// Runs the oldest queued task, if any. Returns `true` if a task ran.
    pub fn turn(&self) -> bool {
        // The guard is released before the task runs so it can schedule more work.
        let task = self.queue.lock().pop_front();
        match task {
            Some(task) => {
                task();
                self.turns.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Runs tasks until the queue is empty. Returns the number of turns executed.
    ///
    /// Never returns if tasks keep scheduling new tasks forever; use
    /// [`run_with_budget`](Self::run_with_budget) for such topologies.
    pub fn run_until_idle(&self) -> usize {
        let mut turns = 0;
        while self.turn() {
            turns += 1;
        }
        trace!(turns, "run loop idle");
        turns
    }

    /// Runs at most `budget` turns.
    ///
    /// Returns the number of turns executed if the queue drained, or
    /// [`RunLoopError::BudgetExhausted`] if tasks remain afterwards.
    pub fn run_with_budget(&self, budget: usize) -> Result<usize, RunLoopError> {
        let mut turns = 0;
        while turns < budget {
            if !self.turn() {
                return Ok(turns);
            }
            turns += 1;
        }

        match self.pending() {
            0 => Ok(turns),
            pending => Err(RunLoopError::BudgetExhausted { budget, pending }),
        }
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Returns `true` if no tasks are waiting.
    pub fn is_idle(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Total turns executed over the loop's lifetime.
    pub fn turns(&self) -> u64 {
        self.turns.load(Ordering::Relaxed)
    }
}

impl Scheduler for RunLoop {
    fn schedule(&self, task: Task) {
        self.queue.lock().push_back(task);
    }
}

impl std::fmt::Debug for RunLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunLoop")
            .field("pending", &self.pending())
            .field("turns", &self.turns())
            .finish()
    }
}
