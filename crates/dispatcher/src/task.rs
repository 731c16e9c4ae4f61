//! The caller-facing handle for one in-flight dispatch.

use std::time::Duration;

use tokio::sync::oneshot;

use dicesched_core::errors::SchedulerError;
use dicesched_core::models::TaskResponse;

/// A pending task result. Backed by a oneshot channel: exactly one
/// response is ever delivered, after which the channel closes. Dropping
/// the `Task` abandons the result without affecting the running job.
#[derive(Debug)]
pub struct Task {
    id: String,
    rx: oneshot::Receiver<TaskResponse>,
}

/// Producer half held by the submitted job. If the job is dropped before
/// resolving (pool shutdown, saturation), the waiter observes a canceled
/// response instead of hanging.
#[derive(Debug)]
pub struct TaskSender {
    tx: oneshot::Sender<TaskResponse>,
}

impl Task {
    pub fn new(id: impl Into<String>) -> (Task, TaskSender) {
        let (tx, rx) = oneshot::channel();
        (
            Task {
                id: id.into(),
                rx,
            },
            TaskSender { tx },
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wait for the response. Consumes the task; there is only ever one
    /// response per dispatch.
    pub async fn wait(self) -> TaskResponse {
        let id = self.id;
        match self.rx.await {
            Ok(response) => response,
            Err(_) => TaskResponse::from_error(SchedulerError::Canceled(format!(
                "task {id} abandoned before completion"
            ))),
        }
    }

    pub async fn wait_timeout(self, timeout: Duration) -> TaskResponse {
        let id = self.id.clone();
        match tokio::time::timeout(timeout, self.wait()).await {
            Ok(response) => response,
            Err(_) => TaskResponse::from_error(SchedulerError::Canceled(format!(
                "timed out waiting for task {id}"
            ))),
        }
    }
}

impl TaskSender {
    /// Deliver the response. A dropped receiver just means nobody is
    /// waiting anymore; the result is discarded silently.
    pub fn resolve(self, response: TaskResponse) {
        let _ = self.tx.send(response);
    }
}
