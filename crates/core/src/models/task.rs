use serde::{Deserialize, Serialize};

use crate::errors::SchedulerError;
use crate::models::job::Job;
use crate::models::service_group::{ServiceGroup, StatusDesc};

/// Every operation the dispatch pipeline can run against an executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskAction {
    Create,
    Update,
    Destroy,
    Remove,
    Status,
    Inspect,
    Cancel,
    Precheck,
    Scale,
    KillPod,
    JobVolumeCreate,
}

impl TaskAction {
    /// Placement-affecting actions run the policy compiler before the
    /// executor sees the spec.
    pub fn affects_placement(&self) -> bool {
        matches!(self, Self::Create | Self::Update | Self::Precheck)
    }
}

/// Spec for a job-volume creation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobVolumeSpec {
    pub namespace: String,
    pub name: String,
    pub kind: String,
}

/// Closed union over every payload an action may carry. The dispatch
/// pipeline matches (action, spec) exhaustively; adapters never see an
/// untyped payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TaskSpec {
    ServiceGroup(Box<ServiceGroup>),
    Job(Box<Job>),
    JobVolume(JobVolumeSpec),
    ContainerId(String),
    None,
}

impl Default for TaskSpec {
    fn default() -> Self {
        Self::None
    }
}

/// What came back from the executor, mirrored on TaskSpec plus a raw
/// escape hatch for backend-specific inspect payloads.
#[derive(Debug, Default)]
pub enum TaskExtra {
    ServiceGroup(Box<ServiceGroup>),
    Job(Box<Job>),
    VolumeId(String),
    Raw(serde_json::Value),
    #[default]
    None,
}

/// One dispatch request. Transient; lives only for the duration of a
/// single `Sched::send`.
#[derive(Debug, Clone)]
pub struct TaskRequest {
    pub executor_kind: String,
    pub executor_name: String,
    pub action: TaskAction,
    pub id: String,
    pub spec: TaskSpec,
}

/// Delivered exactly once per task through the task's oneshot channel.
#[derive(Debug, Default)]
pub struct TaskResponse {
    pub error: Option<SchedulerError>,
    pub status: StatusDesc,
    pub extra: TaskExtra,
}

impl TaskResponse {
    pub fn ok(status: StatusDesc, extra: TaskExtra) -> Self {
        Self {
            error: None,
            status,
            extra,
        }
    }

    pub fn from_error(err: SchedulerError) -> Self {
        Self {
            error: Some(err),
            status: StatusDesc::default(),
            extra: TaskExtra::None,
        }
    }

    pub fn err(&self) -> Option<&SchedulerError> {
        self.error.as_ref()
    }

    pub fn into_result(self) -> Result<(StatusDesc, TaskExtra), SchedulerError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok((self.status, self.extra)),
        }
    }
}
