use serde::{Deserialize, Serialize};

/// Cluster lifecycle event, delivered by the external event source to
/// cluster provisioning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterEvent {
    pub action: ClusterAction,
    pub content: ClusterSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterAction {
    Create,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterType {
    Dcos,
    Kubernetes,
    Edas,
    LocalDocker,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub cluster_type: Option<ClusterType>,
    pub sched_config: Option<SchedConfig>,
}

/// Scheduler-relevant knobs carried on a cluster event. Which fields are
/// meaningful depends on the cluster type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedConfig {
    pub master_url: String,
    pub auth_type: String,
    pub auth_username: String,
    pub auth_password: String,
    pub ca_crt: String,
    pub client_crt: String,
    pub client_key: String,
    pub enable_tag: bool,
    pub cpu_subscribe_ratio: String,
    // edas
    pub edas_console_addr: String,
    pub access_key: String,
    pub access_secret: String,
    pub cluster_id: String,
    pub region_id: String,
    pub logical_region_id: String,
    pub k8s_addr: String,
}
