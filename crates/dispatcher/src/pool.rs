//! Bounded worker pools for task execution.
//!
//! Each executor gets a dedicated pool so a slow backend can only stall
//! its own tasks; executors without one share the default pool. The
//! queue is bounded and submission fails fast when it stays full,
//! surfacing backpressure to callers instead of buffering unboundedly.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

use dicesched_core::errors::{SchedulerError, SchedulerResult};

pub type PoolJob = BoxFuture<'static, ()>;

pub struct WorkerPool {
    name: String,
    submit_timeout: Duration,
    /// Taken on shutdown; a closed sender drains the queue and stops the
    /// workers.
    tx: Mutex<Option<mpsc::Sender<PoolJob>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    pub fn new(
        name: impl Into<String>,
        size: usize,
        queue_capacity: usize,
        submit_timeout: Duration,
    ) -> Self {
        let name = name.into();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let workers = (0..size.max(1))
            .map(|index| tokio::spawn(worker_loop(name.clone(), index, Arc::clone(&rx))))
            .collect();
        Self {
            name,
            submit_timeout,
            tx: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a job. Blocks for at most the configured submit timeout;
    /// a full queue past that is reported as saturation, not queued.
    pub async fn submit(&self, job: PoolJob) -> SchedulerResult<()> {
        let tx = self.tx.lock().await.clone();
        let Some(tx) = tx else {
            return Err(SchedulerError::Canceled(format!(
                "worker pool {} is shut down",
                self.name
            )));
        };
        match tx.send_timeout(job, self.submit_timeout).await {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(_)) => {
                Err(SchedulerError::PoolSaturated(self.name.clone()))
            }
            Err(SendTimeoutError::Closed(_)) => Err(SchedulerError::Canceled(format!(
                "worker pool {} is shut down",
                self.name
            ))),
        }
    }

    /// Stop accepting jobs, run everything already queued, and join the
    /// workers.
    pub async fn shutdown(&self) {
        self.tx.lock().await.take();
        let workers = std::mem::take(&mut *self.workers.lock().await);
        for handle in workers {
            if let Err(err) = handle.await {
                warn!(pool = %self.name, error = %err, "worker task join failed");
            }
        }
        trace!(pool = %self.name, "worker pool stopped");
    }
}

async fn worker_loop(pool: String, index: usize, rx: Arc<Mutex<mpsc::Receiver<PoolJob>>>) {
    loop {
        // Hold the receiver lock only while dequeuing, never across the
        // job itself.
        let job = { rx.lock().await.recv().await };
        match job {
            Some(job) => job.await,
            None => break,
        }
    }
    trace!(%pool, index, "worker stopped");
}
