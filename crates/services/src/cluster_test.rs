use std::sync::Arc;
use std::time::Duration;

use dicesched_config::AppConfig;
use dicesched_core::models::{
    ClusterAction, ClusterEvent, ClusterSpec, ClusterType, ExecutorConfig, SchedConfig,
};
use dicesched_core::traits::get_typed;
use dicesched_dispatcher::plugins::demo_factory;
use dicesched_dispatcher::ExecutorRegistry;
use dicesched_infrastructure::MemStore;

use crate::cluster::ClusterService;

const PREFIX: &str = "/dice/configs/cluster/";

fn service(store: &MemStore) -> ClusterService {
    ClusterService::new(Arc::new(store.clone()), PREFIX)
}

fn event(action: ClusterAction, name: &str, cluster_type: ClusterType, sched: SchedConfig) -> ClusterEvent {
    ClusterEvent {
        action,
        content: ClusterSpec {
            name: name.to_string(),
            cluster_type: Some(cluster_type),
            sched_config: Some(sched),
        },
    }
}

async fn config_at(store: &MemStore, key: &str) -> ExecutorConfig {
    get_typed::<ExecutorConfig>(store, key)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("missing config at {key}"))
}

#[tokio::test]
async fn test_dcos_provisioning_writes_marathon_and_metronome() {
    let store = MemStore::new();
    service(&store)
        .hook(event(
            ClusterAction::Create,
            "c1",
            ClusterType::Dcos,
            SchedConfig {
                master_url: "http://dcos.c1".to_string(),
                ..Default::default()
            },
        ))
        .await
        .unwrap();

    let marathon = config_at(&store, &format!("{PREFIX}c1-marathon")).await;
    assert_eq!(marathon.name, "MARATHONFORC1");
    assert_eq!(marathon.kind, "MARATHON");
    assert_eq!(
        marathon.options.get("ADDR").map(String::as_str),
        Some("http://dcos.c1/service/marathon")
    );
    assert_eq!(marathon.options.get("ENABLETAG").map(String::as_str), Some("true"));
    assert_eq!(marathon.options.get("CPU_NUM_QUOTA").map(String::as_str), Some("-1"));

    let metronome = config_at(&store, &format!("{PREFIX}c1-metronome")).await;
    assert_eq!(metronome.name, "METRONOMEFORC1");
    assert_eq!(
        metronome.options.get("ADDR").map(String::as_str),
        Some("http://dcos.c1/service/metronome")
    );
}

#[tokio::test]
async fn test_kubernetes_provisioning_sets_subscribe_ratios() {
    let store = MemStore::new();
    service(&store)
        .hook(event(
            ClusterAction::Create,
            "k1",
            ClusterType::Kubernetes,
            SchedConfig {
                k8s_addr: "https://k8s.k1:6443".to_string(),
                cpu_subscribe_ratio: "2".to_string(),
                ..Default::default()
            },
        ))
        .await
        .unwrap();

    let k8s = config_at(&store, &format!("{PREFIX}k1-k8s")).await;
    assert_eq!(k8s.kind, "K8S");
    assert_eq!(
        k8s.options.get("DEV_CPU_SUBSCRIBE_RATIO").map(String::as_str),
        Some("2")
    );
    let k8sjob = config_at(&store, &format!("{PREFIX}k1-k8sjob")).await;
    assert_eq!(k8sjob.kind, "K8SJOB");
    assert_eq!(
        k8sjob.options.get("ADDR").map(String::as_str),
        Some("https://k8s.k1:6443")
    );
}

#[tokio::test]
async fn test_edas_provisioning_writes_three_configs() {
    let store = MemStore::new();
    service(&store)
        .hook(event(
            ClusterAction::Create,
            "e1",
            ClusterType::Edas,
            SchedConfig {
                edas_console_addr: "https://edas.console".to_string(),
                access_key: "ak".to_string(),
                access_secret: "sk".to_string(),
                cluster_id: "cid".to_string(),
                k8s_addr: "https://k8s.e1:6443".to_string(),
                ..Default::default()
            },
        ))
        .await
        .unwrap();

    let edas = config_at(&store, &format!("{PREFIX}e1-edas")).await;
    assert_eq!(edas.kind, "EDAS");
    assert_eq!(edas.options.get("ADDR").map(String::as_str), Some("https://edas.console"));
    assert_eq!(edas.options.get("ACCESSKEY").map(String::as_str), Some("ak"));

    let addon = config_at(&store, &format!("{PREFIX}e1-k8s")).await;
    assert_eq!(addon.kind, "K8S");
    assert_eq!(addon.options.get("IS_EDAS").map(String::as_str), Some("true"));

    let k8sjob = config_at(&store, &format!("{PREFIX}e1-k8sjob")).await;
    assert_eq!(k8sjob.kind, "K8SJOB");
}

#[tokio::test]
async fn test_update_patches_addr_and_auth_on_every_config() {
    let store = MemStore::new();
    let clusters = service(&store);
    clusters
        .hook(event(
            ClusterAction::Create,
            "c1",
            ClusterType::Dcos,
            SchedConfig {
                master_url: "http://old.c1".to_string(),
                ..Default::default()
            },
        ))
        .await
        .unwrap();

    clusters
        .hook(event(
            ClusterAction::Update,
            "c1",
            ClusterType::Dcos,
            SchedConfig {
                master_url: "http://new.c1".to_string(),
                auth_type: "basic".to_string(),
                auth_username: "admin".to_string(),
                auth_password: "secret".to_string(),
                ..Default::default()
            },
        ))
        .await
        .unwrap();

    let marathon = config_at(&store, &format!("{PREFIX}c1-marathon")).await;
    assert_eq!(
        marathon.options.get("ADDR").map(String::as_str),
        Some("http://new.c1/service/marathon")
    );
    assert_eq!(
        marathon.options.get("BASICAUTH").map(String::as_str),
        Some("admin:secret")
    );
    let metronome = config_at(&store, &format!("{PREFIX}c1-metronome")).await;
    assert_eq!(
        metronome.options.get("ADDR").map(String::as_str),
        Some("http://new.c1/service/metronome")
    );
}

#[tokio::test]
async fn test_create_without_type_is_rejected() {
    let store = MemStore::new();
    let result = service(&store)
        .hook(ClusterEvent {
            action: ClusterAction::Create,
            content: ClusterSpec {
                name: "c1".to_string(),
                cluster_type: None,
                sched_config: None,
            },
        })
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_provisioning_drives_the_registry_through_the_watch() {
    let store = MemStore::new();
    let registry = ExecutorRegistry::new(Arc::new(store.clone()), &AppConfig::default());
    registry.register_factory("MARATHON", demo_factory()).await;
    registry.register_factory("METRONOME", demo_factory()).await;
    registry.start().await.unwrap();

    service(&store)
        .hook(event(
            ClusterAction::Create,
            "c1",
            ClusterType::Dcos,
            SchedConfig {
                master_url: "http://dcos.c1".to_string(),
                ..Default::default()
            },
        ))
        .await
        .unwrap();

    for _ in 0..200 {
        if registry.get("MARATHONFORC1").await.is_ok()
            && registry.get("METRONOMEFORC1").await.is_ok()
        {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("registry never picked up the provisioned executors");
}
