//! Cluster provisioning: translate cluster lifecycle events into
//! executor configuration documents. The registry reacts through its
//! watch on the config prefix; this service never touches it directly.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use dicesched_core::errors::{SchedulerError, SchedulerResult};
use dicesched_core::labels::{
    OPT_ADDR, OPT_BASIC_AUTH, OPT_CA_CRT, OPT_CLIENT_CRT, OPT_CLIENT_KEY, OPT_CPU_NUM_QUOTA,
    OPT_ENABLE_ORG, OPT_ENABLE_TAG, OPT_ENABLE_WORKSPACE, OPT_IS_EDAS,
};
use dicesched_core::models::{
    ClusterAction, ClusterEvent, ClusterSpec, ClusterType, ExecutorConfig, SchedConfig,
    JOB_KIND_K8S, JOB_KIND_METRONOME, KIND_LOCAL_DOCKER, SERVICE_KIND_EDAS, SERVICE_KIND_K8S,
    SERVICE_KIND_MARATHON,
};
use dicesched_core::traits::{put_typed, KvStore};

use crate::clusterutil::generate_executor_by_cluster;

/// Workspaces that get a CPU subscribe ratio overlay on kubernetes
/// clusters.
const RATIO_WORKSPACES: [&str; 3] = ["DEV", "TEST", "STAGING"];

pub struct ClusterService {
    store: Arc<dyn KvStore>,
    config_prefix: String,
}

impl ClusterService {
    pub fn new(store: Arc<dyn KvStore>, config_prefix: impl Into<String>) -> Self {
        Self {
            store,
            config_prefix: config_prefix.into(),
        }
    }

    pub async fn hook(&self, event: ClusterEvent) -> SchedulerResult<()> {
        match event.action {
            ClusterAction::Create => self.create(event.content).await,
            ClusterAction::Update => self.update(event.content).await,
        }
    }

    async fn create(&self, spec: ClusterSpec) -> SchedulerResult<()> {
        let cluster_type = spec.cluster_type.ok_or_else(|| {
            SchedulerError::Validation(format!("cluster {} carries no type", spec.name))
        })?;
        let sched = spec.sched_config.clone().unwrap_or_default();

        let configs = match cluster_type {
            ClusterType::Dcos => dcos_configs(&spec.name, &sched),
            ClusterType::Kubernetes => kubernetes_configs(&spec.name, &sched),
            ClusterType::Edas => edas_configs(&spec.name, &sched),
            ClusterType::LocalDocker => local_docker_configs(&spec.name, &sched),
        };

        for (suffix, config) in configs {
            let key = format!("{}{}-{}", self.config_prefix, spec.name, suffix);
            put_typed(self.store.as_ref(), &key, &config).await?;
            info!(cluster = %spec.name, executor = %config.name, %key, "executor config written");
        }
        Ok(())
    }

    /// Patch address, auth and certificate options on every config
    /// belonging to the cluster; everything else stays as provisioned.
    async fn update(&self, spec: ClusterSpec) -> SchedulerResult<()> {
        let Some(sched) = spec.sched_config.clone() else {
            warn!(cluster = %spec.name, "cluster update without sched config, nothing to patch");
            return Ok(());
        };

        let mut patched = 0usize;
        for (key, value) in self.store.list_prefix(&self.config_prefix).await? {
            let mut config: ExecutorConfig = match serde_json::from_value(value) {
                Ok(config) => config,
                Err(err) => {
                    warn!(%key, error = %err, "skipping malformed executor config");
                    continue;
                }
            };
            if config.cluster_name != spec.name {
                continue;
            }
            if !sched.master_url.is_empty() {
                let addr = addr_for_kind(&config.kind, &sched);
                config.options.insert(OPT_ADDR.to_string(), addr);
            }
            apply_auth_options(&mut config.options, &sched);
            put_typed(self.store.as_ref(), &key, &config).await?;
            patched += 1;
        }
        info!(cluster = %spec.name, patched, "cluster configs updated");
        Ok(())
    }
}

fn addr_for_kind(kind: &str, sched: &SchedConfig) -> String {
    match kind {
        SERVICE_KIND_MARATHON => format!("{}/service/marathon", sched.master_url),
        JOB_KIND_METRONOME => format!("{}/service/metronome", sched.master_url),
        SERVICE_KIND_EDAS => sched.edas_console_addr.clone(),
        JOB_KIND_K8S => preferred_k8s_addr(sched),
        SERVICE_KIND_K8S => preferred_k8s_addr(sched),
        _ => sched.master_url.clone(),
    }
}

fn preferred_k8s_addr(sched: &SchedConfig) -> String {
    if sched.k8s_addr.is_empty() {
        sched.master_url.clone()
    } else {
        sched.k8s_addr.clone()
    }
}

fn base_config(cluster: &str, kind: &str, sched: &SchedConfig) -> ExecutorConfig {
    let mut options = HashMap::new();
    let addr = addr_for_kind(kind, sched);
    if !addr.is_empty() {
        options.insert(OPT_ADDR.to_string(), addr);
    }
    apply_auth_options(&mut options, sched);
    let mut config = ExecutorConfig {
        name: generate_executor_by_cluster(cluster, kind),
        kind: kind.to_string(),
        cluster_name: cluster.to_string(),
        options,
        options_plus: None,
    };
    fill_default_options(&mut config.options);
    config
}

/// Every provisioned executor gets the platform conventions unless the
/// event already set them.
fn fill_default_options(options: &mut HashMap<String, String>) {
    for key in [OPT_ENABLE_TAG, OPT_ENABLE_ORG, OPT_ENABLE_WORKSPACE] {
        options.entry(key.to_string()).or_insert_with(|| "true".to_string());
    }
    options
        .entry(OPT_CPU_NUM_QUOTA.to_string())
        .or_insert_with(|| "-1".to_string());
}

fn apply_auth_options(options: &mut HashMap<String, String>, sched: &SchedConfig) {
    if sched.auth_type == "basic" && !sched.auth_username.is_empty() {
        options.insert(
            OPT_BASIC_AUTH.to_string(),
            format!("{}:{}", sched.auth_username, sched.auth_password),
        );
    }
    for (key, value) in [
        (OPT_CA_CRT, &sched.ca_crt),
        (OPT_CLIENT_CRT, &sched.client_crt),
        (OPT_CLIENT_KEY, &sched.client_key),
    ] {
        if !value.is_empty() {
            options.insert(key.to_string(), value.clone());
        }
    }
}

fn dcos_configs(cluster: &str, sched: &SchedConfig) -> Vec<(&'static str, ExecutorConfig)> {
    vec![
        ("marathon", base_config(cluster, SERVICE_KIND_MARATHON, sched)),
        ("metronome", base_config(cluster, JOB_KIND_METRONOME, sched)),
    ]
}

fn kubernetes_configs(cluster: &str, sched: &SchedConfig) -> Vec<(&'static str, ExecutorConfig)> {
    let mut k8s = base_config(cluster, SERVICE_KIND_K8S, sched);
    if !sched.cpu_subscribe_ratio.is_empty() {
        for workspace in RATIO_WORKSPACES {
            k8s.options.insert(
                format!("{workspace}_CPU_SUBSCRIBE_RATIO"),
                sched.cpu_subscribe_ratio.clone(),
            );
        }
    }
    vec![
        ("k8s", k8s),
        ("k8sjob", base_config(cluster, JOB_KIND_K8S, sched)),
    ]
}

fn edas_configs(cluster: &str, sched: &SchedConfig) -> Vec<(&'static str, ExecutorConfig)> {
    let mut edas = base_config(cluster, SERVICE_KIND_EDAS, sched);
    for (key, value) in [
        ("ACCESSKEY", &sched.access_key),
        ("ACCESSSECRET", &sched.access_secret),
        ("CLUSTERID", &sched.cluster_id),
        ("REGIONID", &sched.region_id),
        ("LOGICALREGIONID", &sched.logical_region_id),
    ] {
        if !value.is_empty() {
            edas.options.insert(key.to_string(), value.clone());
        }
    }

    // Addons still land on the companion kubernetes cluster.
    let mut k8s_addon = base_config(cluster, SERVICE_KIND_K8S, sched);
    k8s_addon
        .options
        .insert(OPT_IS_EDAS.to_string(), "true".to_string());

    vec![
        ("edas", edas),
        ("k8sjob", base_config(cluster, JOB_KIND_K8S, sched)),
        ("k8s", k8s_addon),
    ]
}

fn local_docker_configs(cluster: &str, sched: &SchedConfig) -> Vec<(&'static str, ExecutorConfig)> {
    vec![("localdocker", base_config(cluster, KIND_LOCAL_DOCKER, sched))]
}
