use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::schedule_info::ScheduleInfo;
use super::volume::VolumeType;

/// The closed status set every backend adapter must map its native
/// lifecycle states onto.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCode {
    #[default]
    Unknown,
    Created,
    Unschedulable,
    Running,
    Healthy,
    UnHealthy,
    StoppedOnOK,
    StoppedOnFailed,
    NotFoundInCluster,
}

impl StatusCode {
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::StoppedOnOK | Self::StoppedOnFailed)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusDesc {
    pub status: StatusCode,
    pub last_message: String,
    pub unscheduled_reasons: Vec<String>,
}

impl StatusDesc {
    pub fn new(status: StatusCode, last_message: impl Into<String>) -> Self {
        Self {
            status,
            last_message: last_message.into(),
            unscheduled_reasons: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resources {
    pub cpu: f64,
    pub max_cpu: f64,
    pub mem: f64,
    pub max_mem: f64,
    pub disk: f64,
}

/// A host-path bind mount; only used for local volumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bind {
    pub container_path: String,
    pub host_path: String,
    pub read_only: bool,
}

/// A volume entry on a service. `host_path` starts empty and is rewritten
/// by the volume driver's attach callback right before dispatch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceVolume {
    pub id: String,
    pub volume_type: VolumeType,
    pub size: i64,
    pub container_path: String,
    pub host_path: String,
}

/// Liveness probe description passed through to the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheck {
    /// "HTTP", "TCP" or "COMMAND".
    pub kind: String,
    pub port: u16,
    pub path: String,
    pub command: String,
    pub duration: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Service {
    pub name: String,
    pub image: String,
    pub cmd: String,
    pub ports: Vec<u16>,
    pub scale: i32,
    pub resources: Resources,
    pub env: HashMap<String, String>,
    pub labels: HashMap<String, String>,
    pub binds: Vec<Bind>,
    pub volumes: Vec<ServiceVolume>,
    pub depends: Vec<String>,
    pub health_check: Option<HealthCheck>,
}

/// The orchestration unit for a set of interdependent long-running
/// services deployed together. Persisted under
/// `/dice/service/<namespace>/<name>`; the KV store is the source of
/// truth, in-memory copies are caches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceGroup {
    pub id: String,
    /// The namespace ("type" historically).
    #[serde(rename = "type")]
    pub namespace: String,
    pub cluster_name: String,
    /// Target executor name; derived from `cluster_name` when empty.
    pub executor: String,
    pub force: bool,
    pub services: Vec<Service>,
    pub labels: HashMap<String, String>,
    pub schedule_info: ScheduleInfo,
    pub status_desc: StatusDesc,
    pub created_time: Option<DateTime<Utc>>,
    pub last_modified_time: Option<DateTime<Utc>>,
    pub extra: HashMap<String, String>,
}

impl ServiceGroup {
    pub fn service_mut(&mut self, name: &str) -> Option<&mut Service> {
        self.services.iter_mut().find(|s| s.name == name)
    }
}
