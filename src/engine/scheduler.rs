// src/engine/scheduler.rs

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::dag::{NodeStatusTracker, Runnable};
use crate::errors::{PaverError, Result};
use crate::exec::{Task, TaskResult, WorkerPool};

use super::RunPhase;

/// Summary of a run that completed without task failures.
#[derive(Debug, Clone)]
pub struct RunReport<K> {
    /// Node ids in the order their results were released.
    pub completed: Vec<K>,
    pub total: usize,
    pub elapsed: Duration,
}

/// Drives a loaded [`NodeStatusTracker`] to completion on a [`WorkerPool`].
///
/// Two roles run concurrently:
/// - the dispatcher takes pending nodes and submits them to the pool;
/// - the result consumer releases finished nodes, or stops dispatch on the
///   first failure.
///
/// Either role can start the drain: shut the pool down (which waits for every
/// accepted task) and close the result stream.
pub struct Scheduler<N: Runnable> {
    tracker: Arc<NodeStatusTracker<N>>,
    workers: usize,
}

impl<N: Runnable> fmt::Debug for Scheduler<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("nodes", &self.tracker.total_nodes())
            .field("workers", &self.workers)
            .finish()
    }
}

impl<N: Runnable> Scheduler<N> {
    pub fn new(tracker: NodeStatusTracker<N>, workers: usize) -> Self {
        Self {
            tracker: Arc::new(tracker),
            workers,
        }
    }

    /// Shared view of the tracker, e.g. to inspect node status after a run.
    /// Take it before calling [`run`](Scheduler::run), which consumes the
    /// scheduler.
    pub fn tracker(&self) -> Arc<NodeStatusTracker<N>> {
        Arc::clone(&self.tracker)
    }

    /// Execute every node once, in dependency order.
    ///
    /// Returns [`PaverError::TaskFailed`] for the first failing task, after
    /// all tasks that were already accepted have finished. The tracker must
    /// be freshly loaded: one that already handed out or released nodes is
    /// rejected with [`PaverError::TrackerInUse`].
    pub async fn run(self) -> Result<RunReport<N::Id>> {
        let started = Instant::now();
        let total = self.tracker.total_nodes();

        self.tracker.validate()?;

        let counts = self.tracker.counts();
        if counts.running + counts.done() > 0 {
            return Err(PaverError::TrackerInUse {
                running: counts.running,
                done: counts.done(),
            });
        }

        if total == 0 {
            info!("nothing to schedule; graph is empty");
            return Ok(RunReport {
                completed: Vec::new(),
                total,
                elapsed: started.elapsed(),
            });
        }

        let pool = WorkerPool::new(self.workers)?;
        let (result_tx, result_rx) =
            mpsc::channel::<TaskResult<N::Id, N::Output>>(self.workers.max(16));
        let (stop_tx, stop_rx) = watch::channel(false);

        info!(nodes = total, workers = self.workers, phase = ?RunPhase::Running, "run started");

        let (dispatched, consumed) = tokio::join!(
            dispatch(&self.tracker, &pool, result_tx, stop_rx),
            consume(&self.tracker, result_rx, stop_tx),
        );

        let elapsed = started.elapsed();
        info!(?elapsed, phase = ?RunPhase::Done, "run finished");

        let completed = match consumed {
            Ok(completed) => completed,
            Err(err) => {
                if let Err(dispatch_err) = dispatched {
                    debug!(error = %dispatch_err, "dispatcher also stopped with an error");
                }
                return Err(err);
            }
        };
        dispatched?;

        Ok(RunReport {
            completed,
            total,
            elapsed,
        })
    }
}

/// Dispatcher role. Owns the original result sender and drops it once the
/// pool has drained, which closes the result stream.
async fn dispatch<N: Runnable>(
    tracker: &NodeStatusTracker<N>,
    pool: &WorkerPool,
    results: mpsc::Sender<TaskResult<N::Id, N::Output>>,
    mut stop: watch::Receiver<bool>,
) -> Result<()> {
    let mut outcome = Ok(());

    loop {
        let pending = tokio::select! {
            biased;
            _ = stop.wait_for(|stopped| *stopped) => {
                debug!("dispatch stopped after a task failure");
                break;
            }
            pending = tracker.next_pending() => pending,
        };

        let id = pending.node.id();
        let task = Task {
            id: id.clone(),
            thunk: Arc::clone(&pending.node).run(),
        };

        debug!(node = ?id, is_last = pending.is_last, "dispatching node");

        if let Err(err) = pool.submit(task, results.clone()).await {
            error!(node = ?id, error = %err, "failed to submit node to worker pool");
            outcome = Err(err);
            break;
        }

        if pending.is_last {
            debug!("last pending node dispatched");
            break;
        }
    }

    info!(phase = ?RunPhase::Draining, in_flight = pool.in_flight(), "draining worker pool");
    pool.shutdown().await;
    drop(results);

    outcome
}

/// Result-consumer role. Releases successful nodes until the first failure;
/// after that it keeps receiving so every in-flight result is drained.
async fn consume<N: Runnable>(
    tracker: &NodeStatusTracker<N>,
    mut results: mpsc::Receiver<TaskResult<N::Id, N::Output>>,
    stop: watch::Sender<bool>,
) -> Result<Vec<N::Id>> {
    let mut completed = Vec::new();
    let mut failure: Option<PaverError> = None;

    while let Some(result) = results.recv().await {
        if failure.is_some() {
            debug!(
                node = ?result.id,
                success = result.is_success(),
                "discarding result drained after failure"
            );
            continue;
        }

        match result.outcome {
            Ok(_) => {
                let status = tracker.release_node(&result.id);
                info!(node = ?result.id, ?status, "node completed");
                completed.push(result.id);
            }
            Err(err) => {
                error!(
                    node = ?result.id,
                    error = %format!("{err:#}"),
                    "node failed; stopping dispatch"
                );
                failure = Some(PaverError::TaskFailed {
                    task: format!("{:?}", result.id),
                    reason: format!("{err:#}"),
                });
                if stop.send(true).is_err() {
                    warn!("dispatcher already finished before stop signal");
                }
            }
        }
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(completed),
    }
}
