//! The dispatch front door.
//!
//! `Sched::send` resolves the target pool, queues a closure that runs
//! the full pipeline (executor resolution, policy compilation for
//! placement-affecting actions, the backend call) and returns a `Task`
//! the caller awaits. Submission failures resolve the task immediately
//! with the error; callers never distinguish "could not queue" from
//! "queued and failed" structurally, only by the error variant.

use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, warn};

use dicesched_core::errors::{SchedulerError, SchedulerResult};
use dicesched_core::models::{
    ExecutorWholeConfigs, StatusCode, StatusDesc, TaskAction, TaskExtra, TaskRequest, TaskResponse,
    TaskSpec,
};
use dicesched_core::traits::Executor;
use dicesched_policy::PolicyCompiler;

use crate::registry::ExecutorRegistry;
use crate::task::Task;

#[derive(Clone)]
pub struct Sched {
    registry: Arc<ExecutorRegistry>,
}

impl Sched {
    pub fn new(registry: Arc<ExecutorRegistry>) -> Self {
        Self { registry }
    }

    /// Dispatch one task. The returned `Task` resolves exactly once,
    /// either with the executor's response or with the failure that
    /// prevented execution.
    pub async fn send(&self, request: TaskRequest) -> SchedulerResult<Task> {
        let (task, sender) = Task::new(request.id.clone());
        let task_id = request.id.clone();
        let executor_name = request.executor_name.clone();
        debug!(id = %task_id, executor = %executor_name, action = ?request.action, "task submitted");

        let registry = Arc::clone(&self.registry);
        let job = async move {
            let response = execute(registry, request).await;
            sender.resolve(response);
        }
        .boxed();

        let submitted = match self.registry.pool(&executor_name).await {
            Some(pool) => pool.submit(job).await,
            None => self.registry.default_pool().submit(job).await,
        };
        match submitted {
            Ok(()) => Ok(task),
            Err(err) => {
                // The queued closure (and its sender) was dropped; hand
                // back a task already resolved with the rejection.
                warn!(id = %task_id, error = %err, "task submission rejected");
                let (task, sender) = Task::new(task_id);
                sender.resolve(TaskResponse::from_error(err));
                Ok(task)
            }
        }
    }
}

async fn execute(registry: Arc<ExecutorRegistry>, request: TaskRequest) -> TaskResponse {
    let TaskRequest {
        executor_kind,
        executor_name,
        action,
        id,
        mut spec,
    } = request;

    let executor = match registry.find(&executor_name, &executor_kind).await {
        Ok(executor) => executor,
        Err(err) => return TaskResponse::from_error(err),
    };

    if action.affects_placement() {
        let configs = match registry.configs_of(executor.name()).await {
            Ok(configs) => configs,
            Err(err) => return TaskResponse::from_error(err),
        };
        apply_policy(&configs, &mut spec);
    }

    match run_action(executor.as_ref(), action, spec, &id).await {
        Ok(response) => response,
        Err(err) => {
            debug!(%id, executor = %executor.name(), error = %err, "task failed");
            TaskResponse::from_error(err)
        }
    }
}

/// Compile placement intent into constraint tuples and option overrides,
/// in place, right before the executor sees the spec.
fn apply_policy(configs: &ExecutorWholeConfigs, spec: &mut TaskSpec) {
    let compiler = PolicyCompiler::new();
    match spec {
        TaskSpec::ServiceGroup(group) => {
            let policy = compiler.compile(configs, &group.labels, &group.schedule_info);
            group.schedule_info.constraints = policy.constraints;
            group.extra.extend(policy.refined_options);
        }
        TaskSpec::Job(job) => {
            let policy = compiler.compile(configs, &job.labels, &job.schedule_info);
            job.schedule_info.constraints = policy.constraints;
            job.env.extend(policy.refined_options);
        }
        _ => {}
    }
}

async fn run_action(
    executor: &dyn Executor,
    action: TaskAction,
    spec: TaskSpec,
    id: &str,
) -> SchedulerResult<TaskResponse> {
    let response = match action {
        TaskAction::Create => {
            let extra = executor.create(spec).await?;
            TaskResponse::ok(StatusDesc::new(StatusCode::Created, "created"), extra)
        }
        TaskAction::Update => {
            let extra = executor.update(spec).await?;
            TaskResponse::ok(StatusDesc::new(StatusCode::Created, "updated"), extra)
        }
        TaskAction::Destroy => {
            executor.destroy(spec).await?;
            TaskResponse::ok(
                StatusDesc::new(StatusCode::StoppedOnOK, "destroyed"),
                TaskExtra::None,
            )
        }
        TaskAction::Remove => {
            executor.remove(spec).await?;
            TaskResponse::ok(
                StatusDesc::new(StatusCode::StoppedOnOK, "removed"),
                TaskExtra::None,
            )
        }
        TaskAction::Status => {
            let status = executor.status(id).await?;
            TaskResponse::ok(status, TaskExtra::None)
        }
        TaskAction::Inspect => {
            let extra = executor.inspect(id).await?;
            TaskResponse::ok(StatusDesc::default(), extra)
        }
        TaskAction::Cancel => {
            let extra = executor.cancel(id).await?;
            TaskResponse::ok(StatusDesc::new(StatusCode::StoppedOnOK, "canceled"), extra)
        }
        TaskAction::Precheck => {
            let status = executor.precheck(spec).await?;
            TaskResponse::ok(status, TaskExtra::None)
        }
        TaskAction::Scale => {
            let extra = executor.scale(spec).await?;
            TaskResponse::ok(StatusDesc::new(StatusCode::Created, "scaled"), extra)
        }
        TaskAction::KillPod => match spec {
            TaskSpec::ContainerId(container_id) => {
                executor.kill_pod(&container_id).await?;
                TaskResponse::ok(StatusDesc::default(), TaskExtra::None)
            }
            other => {
                return Err(SchedulerError::Validation(format!(
                    "KillPod expects a container id, got {other:?}"
                )))
            }
        },
        TaskAction::JobVolumeCreate => {
            let volume_id = executor.job_volume_create(spec).await?;
            TaskResponse::ok(StatusDesc::default(), TaskExtra::VolumeId(volume_id))
        }
    };
    Ok(response)
}
