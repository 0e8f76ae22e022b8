// src/exec/pool.rs

//! Fixed-size worker pool.
//!
//! `n` long-lived workers pull jobs from one shared bounded queue. Every
//! accepted task publishes exactly one [`TaskResult`] on the sink it was
//! submitted with, whether it succeeds, fails or panics.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::anyhow;
use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{PaverError, Result};
use crate::exec::task::{Task, TaskResult};

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;
type SharedQueue = Arc<AsyncMutex<mpsc::Receiver<Job>>>;

#[derive(Debug, Default)]
struct PoolState {
    closed: bool,
    in_flight: usize,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<PoolState>,
    /// Raised every time `in_flight` drops to zero.
    idle: Notify,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Decrements the in-flight counter when the job wrapper is dropped, so the
/// count stays correct even if a job never runs.
struct InFlightGuard(Arc<Shared>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut state = self.0.lock();
        state.in_flight -= 1;
        let drained = state.in_flight == 0;
        drop(state);

        if drained {
            self.0.idle.notify_waiters();
        }
    }
}

struct Worker {
    id: usize,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

/// Pool of `n` workers executing submitted tasks concurrently.
pub struct WorkerPool {
    shared: Arc<Shared>,
    queue: Mutex<Option<mpsc::Sender<Job>>>,
    workers: Mutex<Vec<Worker>>,
    size: usize,
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.size)
            .field("state", &*self.shared.lock())
            .finish_non_exhaustive()
    }
}

impl WorkerPool {
    /// Start `size` workers. Must be called from within a Tokio runtime.
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(PaverError::ConfigError(
                "worker pool needs at least one worker (got 0)".to_string(),
            ));
        }

        let (tx, rx) = mpsc::channel::<Job>(size);
        let queue: SharedQueue = Arc::new(AsyncMutex::new(rx));

        let workers = (0..size)
            .map(|id| {
                let (stop_tx, stop_rx) = oneshot::channel();
                let handle = tokio::spawn(worker_loop(id, Arc::clone(&queue), stop_rx));
                Worker {
                    id,
                    stop: Some(stop_tx),
                    handle,
                }
            })
            .collect();

        info!(workers = size, "worker pool started");

        Ok(Self {
            shared: Arc::new(Shared::default()),
            queue: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
            size,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.size
    }

    /// Number of accepted tasks that have not yet published their result.
    pub fn in_flight(&self) -> usize {
        self.shared.lock().in_flight
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// Queue `task` for execution; its result is sent to `results`.
    ///
    /// Fails with [`PaverError::PoolClosed`] once shutdown has begun. The
    /// closed check and the in-flight increment happen under one lock, so a
    /// submission racing [`shutdown`](WorkerPool::shutdown) is either fully
    /// accepted (and waited for) or cleanly rejected.
    pub async fn submit<K, O>(
        &self,
        task: Task<K, O>,
        results: mpsc::Sender<TaskResult<K, O>>,
    ) -> Result<()>
    where
        K: fmt::Debug + Send + 'static,
        O: Send + 'static,
    {
        let queue = {
            let mut state = self.shared.lock();
            if state.closed {
                return Err(PaverError::PoolClosed);
            }
            let Some(queue) = self.queue_sender() else {
                return Err(PaverError::PoolClosed);
            };
            state.in_flight += 1;
            queue
        };

        let guard = InFlightGuard(Arc::clone(&self.shared));
        let job: Job = Box::pin(async move {
            let _guard = guard;
            let Task { id, thunk } = task;

            // Run the body on its own task so a panic surfaces as a JoinError
            // instead of taking the worker down.
            let outcome = match tokio::spawn(thunk).await {
                Ok(outcome) => outcome,
                Err(err) => Err(anyhow!("task panicked: {err}")),
            };

            if results.send(TaskResult { id, outcome }).await.is_err() {
                warn!("result receiver dropped; task result discarded");
            }
        });

        // On failure the job (and its guard) is dropped, undoing the increment.
        queue.send(job).await.map_err(|_| PaverError::PoolClosed)
    }

    /// Stop accepting work, wait for every accepted task to publish its
    /// result, then stop the workers and close the queue.
    ///
    /// Calling it again is a no-op.
    pub async fn shutdown(&self) {
        {
            let mut state = self.shared.lock();
            if !state.closed {
                state.closed = true;
                info!(in_flight = state.in_flight, "worker pool closing");
            }
        }

        loop {
            // Register before checking so a concurrent drop to zero is not missed.
            let drained = self.shared.idle.notified();
            let in_flight = self.in_flight();
            if in_flight == 0 {
                break;
            }
            debug!(in_flight, "waiting for accepted tasks to finish");
            drained.await;
        }

        let workers = std::mem::take(
            &mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for mut worker in workers {
            if let Some(stop) = worker.stop.take() {
                let _ = stop.send(());
            }
            if let Err(err) = worker.handle.await {
                warn!(worker = worker.id, error = %err, "worker terminated abnormally");
            }
        }

        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        info!("worker pool shut down");
    }

    fn queue_sender(&self) -> Option<mpsc::Sender<Job>> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

async fn worker_loop(id: usize, queue: SharedQueue, mut stop: oneshot::Receiver<()>) {
    debug!(worker = id, "worker started");

    loop {
        let job = tokio::select! {
            _ = &mut stop => break,
            job = next_job(&queue) => job,
        };

        match job {
            Some(job) => job.await,
            None => break,
        }
    }

    debug!(worker = id, "worker stopped");
}

async fn next_job(queue: &SharedQueue) -> Option<Job> {
    queue.lock().await.recv().await
}
