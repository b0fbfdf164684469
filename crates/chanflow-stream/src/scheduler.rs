//! Tokio-backed scheduler for chanflow deliveries.

use crate::error::StreamError;
use chanflow::{Channel, Config, Scheduler, Task};
use parking_lot::Mutex;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Runs chanflow deliveries on a dedicated tokio task.
///
/// Scheduled tasks travel through an unbounded queue to a single worker task
/// that runs them one at a time, in scheduling order. Channels may be used
/// from any thread; their consumers always run on the worker.
///
/// # Shutdown
///
/// [`shutdown`](Self::shutdown) lets the worker run every task queued so far
/// and then stop. Tasks scheduled after that point (including tasks scheduled
/// by the final ones) are dropped and logged.
pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<Task>,
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    executed: Arc<AtomicU64>,
}

impl TokioScheduler {
    /// Spawns the worker on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn() -> Arc<Self> {
        Self::spawn_on(&Handle::current())
    }

    /// Spawns the worker on the given runtime.
    pub fn spawn_on(handle: &Handle) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let executed = Arc::new(AtomicU64::new(0));

        let worker = handle.spawn(run_worker(rx, shutdown_rx, Arc::clone(&executed)));

        Arc::new(Self {
            tx,
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            worker: Mutex::new(Some(worker)),
            executed,
        })
    }

    /// Creates a channel whose deliveries run on this scheduler.
    pub fn channel<T: Send + 'static>(self: &Arc<Self>) -> Channel<T> {
        Channel::new(Arc::clone(self) as Arc<dyn Scheduler>)
    }

    /// Creates a channel with a custom configuration whose deliveries run on this scheduler.
    pub fn channel_with_config<T: Send + 'static>(self: &Arc<Self>, config: Config) -> Channel<T> {
        Channel::with_config(Arc::clone(self) as Arc<dyn Scheduler>, config)
    }

    /// Stops the worker after it has run every task queued so far.
    ///
    /// Idempotent: later calls return `Ok(())` immediately.
    pub async fn shutdown(&self) -> Result<(), StreamError> {
        if let Some(tx) = self.shutdown_tx.lock().take() {
            // The worker may already be gone; either way it is stopping.
            let _ = tx.send(());
        }

        let worker = self.worker.lock().take();
        match worker {
            Some(worker) => worker
                .await
                .map_err(|e| StreamError::WorkerFailed(e.to_string())),
            None => Ok(()),
        }
    }

    /// Returns `true` while the worker accepts new tasks.
    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Number of tasks the worker has run.
    pub fn executed(&self) -> u64 {
        self.executed.load(Ordering::Relaxed)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, task: Task) {
        if self.tx.send(task).is_err() {
            warn!("task scheduled after scheduler shutdown dropped");
        }
    }
}

impl fmt::Debug for TokioScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioScheduler")
            .field("running", &self.is_running())
            .field("executed", &self.executed())
            .finish()
    }
}

async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<Task>,
    mut shutdown_rx: oneshot::Receiver<()>,
    executed: Arc<AtomicU64>,
) {
    loop {
        tokio::select! {
            biased;

            task = rx.recv() => match task {
                Some(task) => run_task(task, &executed),
                None => break,
            },
            _ = &mut shutdown_rx => {
                // Stop accepting, then run whatever is already queued.
                rx.close();
                while let Some(task) = rx.recv().await {
                    run_task(task, &executed);
                }
                break;
            }
        }
    }

    debug!(
        executed = executed.load(Ordering::Relaxed),
        "scheduler worker stopped"
    );
}

fn run_task(task: Task, executed: &AtomicU64) {
    if catch_unwind(AssertUnwindSafe(task)).is_err() {
        error!("scheduled task panicked");
    }
    executed.fetch_add(1, Ordering::Relaxed);
}
