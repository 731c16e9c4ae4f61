//! The backend adapter contract.
//!
//! One implementation per cluster technology (kubernetes, marathon,
//! metronome, ...). Instances are built by registered factories, owned
//! exclusively by the executor registry, and only borrowed by the
//! dispatch pipeline for the duration of one task.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::errors::SchedulerResult;
use crate::models::{StatusDesc, TaskExtra, TaskSpec};

/// A backend-native event forwarded through the registry's listener.
#[derive(Debug, Clone)]
pub struct ExecutorEvent {
    pub executor: String,
    pub workload_id: String,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeResource {
    pub cpu_total: f64,
    pub cpu_used: f64,
    pub mem_total: f64,
    pub mem_used: f64,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceInfo {
    pub nodes: HashMap<String, NodeResource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetNodeLabelsRequest {
    pub hosts: Vec<String>,
    pub labels: Vec<String>,
}

/// Capability contract every backend plugin implements.
///
/// Conventions binding on adapters:
/// - `destroy`/`remove` on an already-absent remote resource is success;
/// - `status` maps native lifecycle states onto the closed `StatusCode`
///   set, never invents new states;
/// - errors are returned, never retried internally.
#[async_trait]
pub trait Executor: Send + Sync {
    fn kind(&self) -> &str;
    fn name(&self) -> &str;

    async fn create(&self, spec: TaskSpec) -> SchedulerResult<TaskExtra>;
    async fn update(&self, spec: TaskSpec) -> SchedulerResult<TaskExtra>;
    async fn destroy(&self, spec: TaskSpec) -> SchedulerResult<()>;
    async fn remove(&self, spec: TaskSpec) -> SchedulerResult<()>;
    async fn status(&self, id: &str) -> SchedulerResult<StatusDesc>;
    async fn inspect(&self, id: &str) -> SchedulerResult<TaskExtra>;
    async fn cancel(&self, id: &str) -> SchedulerResult<TaskExtra>;
    async fn precheck(&self, spec: TaskSpec) -> SchedulerResult<StatusDesc>;
    async fn scale(&self, spec: TaskSpec) -> SchedulerResult<TaskExtra>;
    async fn kill_pod(&self, container_id: &str) -> SchedulerResult<()>;
    async fn job_volume_create(&self, spec: TaskSpec) -> SchedulerResult<String>;
    async fn resource_info(&self, brief: bool) -> SchedulerResult<ResourceInfo>;
    async fn set_node_labels(&self, req: SetNodeLabelsRequest) -> SchedulerResult<()>;

    /// Invoked by the registry right before the instance is dropped on a
    /// config delete; adapters release backend-side resources here.
    async fn cleanup_before_delete(&self);

    /// Backends with a native event stream hand a receiver to the
    /// registry, which forwards events until the executor is deleted.
    fn subscribe_events(&self) -> Option<mpsc::Receiver<ExecutorEvent>> {
        None
    }
}

impl std::fmt::Debug for dyn Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .finish()
    }
}
