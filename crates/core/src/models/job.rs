use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::executor_config::{
    JOB_KIND_FLINK, JOB_KIND_K8S, JOB_KIND_METRONOME, JOB_KIND_SPARK, KIND_LOCAL_DOCKER,
};
use super::schedule_info::ScheduleInfo;
use super::service_group::StatusCode;

/// Batch workload flavor; decides which executor kind a job is dispatched
/// to when no explicit executor is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    #[default]
    Metronome,
    K8SJob,
    Flink,
    Spark,
    LocalDocker,
}

impl JobKind {
    pub fn executor_kind(&self) -> &'static str {
        match self {
            JobKind::Metronome => JOB_KIND_METRONOME,
            JobKind::K8SJob => JOB_KIND_K8S,
            JobKind::Flink => JOB_KIND_FLINK,
            JobKind::Spark => JOB_KIND_SPARK,
            JobKind::LocalDocker => KIND_LOCAL_DOCKER,
        }
    }
}

/// A batch/one-shot workload unit. Persisted under
/// `/dice/job/<namespace>/<name>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Job {
    /// Assigned once at creation, stable across restarts.
    pub id: String,
    pub namespace: String,
    pub name: String,
    pub kind: JobKind,
    pub cluster_name: String,
    pub executor: String,
    pub image: String,
    pub cmd: String,
    pub status: StatusCode,
    pub last_message: String,
    pub labels: HashMap<String, String>,
    pub env: HashMap<String, String>,
    pub schedule_info: ScheduleInfo,
    pub created_time: Option<DateTime<Utc>>,
    pub last_start_time: Option<DateTime<Utc>>,
    pub last_modify: Option<DateTime<Utc>>,
}

impl Job {
    /// `namespace/name`, the job's identity in task requests and logs.
    pub fn full_id(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}
