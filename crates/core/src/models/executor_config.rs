use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Well-known executor kinds. Every kind must have a factory registered
/// with the executor registry before a config naming it shows up in the
/// configuration store.
pub const SERVICE_KIND_MARATHON: &str = "MARATHON";
pub const SERVICE_KIND_K8S: &str = "K8S";
pub const SERVICE_KIND_EDAS: &str = "EDAS";
pub const JOB_KIND_METRONOME: &str = "METRONOME";
pub const JOB_KIND_K8S: &str = "K8SJOB";
pub const JOB_KIND_FLINK: &str = "FLINK";
pub const JOB_KIND_SPARK: &str = "SPARK";
pub const KIND_LOCAL_DOCKER: &str = "LOCALDOCKER";

/// One backend executor instance, as persisted in the configuration
/// store. `name` is globally unique among live executors; `kind` selects
/// the factory that builds the instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default)]
    pub options: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options_plus: Option<OptionsPlus>,
}

/// Fine-grained option overlays, per org and per workspace. Consumed by
/// the policy compiler when refining the outgoing configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionsPlus {
    #[serde(default)]
    pub orgs: Vec<OrgOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrgOptions {
    pub name: String,
    #[serde(default)]
    pub options: HashMap<String, String>,
    #[serde(default)]
    pub workspaces: Vec<WorkspaceOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceOptions {
    pub name: String,
    #[serde(default)]
    pub options: HashMap<String, String>,
}

/// Snapshot of everything the registry knows about one executor's
/// configuration at creation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutorWholeConfigs {
    pub basic_config: ExecutorConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plus_configs: Option<OptionsPlus>,
}

impl ExecutorWholeConfigs {
    /// Option lookup falling back from the basic config.
    pub fn basic_option(&self, key: &str) -> Option<&str> {
        self.basic_config.options.get(key).map(String::as_str)
    }
}
