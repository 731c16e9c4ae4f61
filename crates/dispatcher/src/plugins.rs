//! Built-in executor plugins.
//!
//! `DemoExecutor` is a fully in-process backend: workloads live in a
//! table, lifecycle transitions are immediate. It exists so the daemon
//! runs end to end without a real cluster and doubles as the reference
//! adapter implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use dicesched_core::errors::{SchedulerError, SchedulerResult};
use dicesched_core::models::{ExecutorConfig, StatusCode, StatusDesc, TaskExtra, TaskSpec};
use dicesched_core::traits::{
    Executor, NodeResource, ResourceInfo, SetNodeLabelsRequest,
};

use crate::registry::ExecutorFactory;

struct Workload {
    spec: TaskSpec,
    status: StatusDesc,
}

pub struct DemoExecutor {
    kind: String,
    name: String,
    workloads: RwLock<HashMap<String, Workload>>,
    node_labels: RwLock<HashMap<String, Vec<String>>>,
}

impl DemoExecutor {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            workloads: RwLock::new(HashMap::new()),
            node_labels: RwLock::new(HashMap::new()),
        }
    }
}

/// A factory usable for any executor kind; the instance takes its kind
/// and name from the configuration document.
pub fn demo_factory() -> ExecutorFactory {
    Arc::new(|config: ExecutorConfig| {
        async move {
            let executor = DemoExecutor::new(config.kind, config.name);
            Ok(Arc::new(executor) as Arc<dyn Executor>)
        }
        .boxed()
    })
}

fn workload_id(spec: &TaskSpec) -> SchedulerResult<String> {
    match spec {
        TaskSpec::ServiceGroup(group) => Ok(format!("{}/{}", group.namespace, group.id)),
        TaskSpec::Job(job) => Ok(job.full_id()),
        TaskSpec::JobVolume(volume) => Ok(format!("{}/{}", volume.namespace, volume.name)),
        other => Err(SchedulerError::Validation(format!(
            "workload spec carries no identity: {other:?}"
        ))),
    }
}

fn spec_extra(spec: &TaskSpec) -> TaskExtra {
    match spec {
        TaskSpec::ServiceGroup(group) => TaskExtra::ServiceGroup(group.clone()),
        TaskSpec::Job(job) => TaskExtra::Job(job.clone()),
        _ => TaskExtra::None,
    }
}

#[async_trait]
impl Executor for DemoExecutor {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn create(&self, spec: TaskSpec) -> SchedulerResult<TaskExtra> {
        let id = workload_id(&spec)?;
        let extra = spec_extra(&spec);
        debug!(executor = %self.name, %id, "workload created");
        self.workloads.write().await.insert(
            id,
            Workload {
                spec,
                status: StatusDesc::new(StatusCode::Running, "running"),
            },
        );
        Ok(extra)
    }

    async fn update(&self, spec: TaskSpec) -> SchedulerResult<TaskExtra> {
        let id = workload_id(&spec)?;
        let mut workloads = self.workloads.write().await;
        if !workloads.contains_key(&id) {
            return Err(SchedulerError::NotFound(id));
        }
        let extra = spec_extra(&spec);
        workloads.insert(
            id,
            Workload {
                spec,
                status: StatusDesc::new(StatusCode::Running, "updated"),
            },
        );
        Ok(extra)
    }

    async fn destroy(&self, spec: TaskSpec) -> SchedulerResult<()> {
        let id = workload_id(&spec)?;
        // Destroying something already gone is success.
        if self.workloads.write().await.remove(&id).is_some() {
            debug!(executor = %self.name, %id, "workload destroyed");
        }
        Ok(())
    }

    async fn remove(&self, spec: TaskSpec) -> SchedulerResult<()> {
        self.destroy(spec).await
    }

    async fn status(&self, id: &str) -> SchedulerResult<StatusDesc> {
        Ok(self
            .workloads
            .read()
            .await
            .get(id)
            .map(|w| w.status.clone())
            .unwrap_or_else(|| StatusDesc::new(StatusCode::NotFoundInCluster, "not found")))
    }

    async fn inspect(&self, id: &str) -> SchedulerResult<TaskExtra> {
        let workloads = self.workloads.read().await;
        let workload = workloads
            .get(id)
            .ok_or_else(|| SchedulerError::NotFound(id.to_string()))?;
        Ok(spec_extra(&workload.spec))
    }

    async fn cancel(&self, id: &str) -> SchedulerResult<TaskExtra> {
        let mut workloads = self.workloads.write().await;
        let workload = workloads
            .get_mut(id)
            .ok_or_else(|| SchedulerError::NotFound(id.to_string()))?;
        workload.status = StatusDesc::new(StatusCode::StoppedOnOK, "canceled");
        Ok(spec_extra(&workload.spec))
    }

    async fn precheck(&self, spec: TaskSpec) -> SchedulerResult<StatusDesc> {
        workload_id(&spec)?;
        Ok(StatusDesc::new(StatusCode::Created, "placement accepted"))
    }

    async fn scale(&self, spec: TaskSpec) -> SchedulerResult<TaskExtra> {
        let id = workload_id(&spec)?;
        let mut workloads = self.workloads.write().await;
        let workload = workloads
            .get_mut(&id)
            .ok_or_else(|| SchedulerError::NotFound(id.clone()))?;
        let extra = spec_extra(&spec);
        workload.spec = spec;
        Ok(extra)
    }

    async fn kill_pod(&self, container_id: &str) -> SchedulerResult<()> {
        debug!(executor = %self.name, %container_id, "pod killed");
        Ok(())
    }

    async fn job_volume_create(&self, spec: TaskSpec) -> SchedulerResult<String> {
        let id = workload_id(&spec)?;
        let volume_id = format!("{}-vol-{}", id.replace('/', "-"), Uuid::new_v4().simple());
        debug!(executor = %self.name, %volume_id, "job volume created");
        Ok(volume_id)
    }

    async fn resource_info(&self, _brief: bool) -> SchedulerResult<ResourceInfo> {
        let mut nodes = HashMap::new();
        let labeled = self.node_labels.read().await;
        nodes.insert(
            "node-0".to_string(),
            NodeResource {
                cpu_total: 8.0,
                cpu_used: 0.0,
                mem_total: 16384.0,
                mem_used: 0.0,
                labels: labeled.get("node-0").cloned().unwrap_or_default(),
            },
        );
        for (host, labels) in labeled.iter().filter(|(host, _)| *host != "node-0") {
            nodes.insert(
                host.clone(),
                NodeResource {
                    cpu_total: 8.0,
                    cpu_used: 0.0,
                    mem_total: 16384.0,
                    mem_used: 0.0,
                    labels: labels.clone(),
                },
            );
        }
        Ok(ResourceInfo { nodes })
    }

    async fn set_node_labels(&self, req: SetNodeLabelsRequest) -> SchedulerResult<()> {
        let mut labeled = self.node_labels.write().await;
        for host in req.hosts {
            labeled.insert(host, req.labels.clone());
        }
        Ok(())
    }

    async fn cleanup_before_delete(&self) {
        let drained = self.workloads.write().await.drain().count();
        info!(executor = %self.name, workloads = drained, "executor cleaned up");
    }
}
