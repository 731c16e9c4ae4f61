use std::sync::Arc;

use futures::FutureExt;

use dicesched_config::AppConfig;
use dicesched_core::errors::SchedulerError;
use dicesched_core::labels::{LABEL_EXCLUDE_TAGS, LABEL_MATCH_TAGS, LAST_RESTART_TIME_KEY};
use dicesched_core::models::{
    ExecutorConfig, ServiceGroup, ServiceVolume, StatusCode, VolumeCreateConfig, VolumeType,
};
use dicesched_core::traits::{get_typed, put_typed, Executor};
use dicesched_dispatcher::plugins::demo_factory;
use dicesched_dispatcher::{ExecutorFactory, ExecutorRegistry, Sched};
use dicesched_infrastructure::MemStore;
use dicesched_testing_utils::{MockExecutor, ServiceGroupBuilder};

use crate::servicegroup::ServiceGroupService;
use crate::volume::VolumeService;

const PREFIX: &str = "/dice/configs/cluster/";
const SERVICE_DIR: &str = "/dice/service";

async fn seed_executor(store: &MemStore, key_suffix: &str, name: &str, kind: &str) {
    let config = ExecutorConfig {
        name: name.to_string(),
        kind: kind.to_string(),
        cluster_name: "c1".to_string(),
        ..Default::default()
    };
    put_typed(store, &format!("{PREFIX}{key_suffix}"), &config)
        .await
        .unwrap();
}

async fn setup() -> (MemStore, Arc<VolumeService>, ServiceGroupService) {
    let store = MemStore::new();
    seed_executor(&store, "c1-marathon", "MARATHONFORC1", "MARATHON").await;

    let registry = ExecutorRegistry::new(Arc::new(store.clone()), &AppConfig::default());
    registry.register_factory("MARATHON", demo_factory()).await;
    registry.start().await.unwrap();

    let volumes = Arc::new(VolumeService::new(Arc::new(store.clone()), "/dice/volume"));
    let service = ServiceGroupService::new(
        Arc::new(store.clone()),
        Sched::new(registry),
        Arc::clone(&volumes),
        SERVICE_DIR,
    );
    (store, volumes, service)
}

fn web_group(name: &str) -> ServiceGroup {
    ServiceGroupBuilder::new("services", name)
        .cluster("c1")
        .service("web", 1)
        .build()
}

async fn stored(store: &MemStore, name: &str) -> Option<ServiceGroup> {
    get_typed::<ServiceGroup>(store, &format!("{SERVICE_DIR}/services/{name}"))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_create_derives_executor_and_persists() {
    let (store, _volumes, service) = setup().await;
    let created = service.create(web_group("web-1")).await.unwrap();

    assert_eq!(created.executor, "MARATHONFORC1");
    assert_eq!(created.status_desc.status, StatusCode::Created);
    assert!(created.labels.contains_key(LABEL_MATCH_TAGS));
    assert!(created.labels.contains_key(LABEL_EXCLUDE_TAGS));
    assert!(created
        .schedule_info
        .likes
        .iter()
        .any(|l| l == "service-stateless"));
    assert!(created.schedule_info.is_unlocked);

    let doc = stored(&store, "web-1").await.expect("document persisted");
    assert_eq!(doc.executor, "MARATHONFORC1");
}

#[tokio::test]
async fn test_create_rejects_bad_names() {
    let (_store, _volumes, service) = setup().await;
    let mut group = web_group("web-1");
    group.namespace = "bad/ns".to_string();
    assert!(matches!(
        service.create(group).await,
        Err(SchedulerError::Validation(_))
    ));
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let (store, _volumes, service) = setup().await;
    // Never created: success.
    service.delete("services", "ghost", false).await.unwrap();

    service.create(web_group("web-1")).await.unwrap();
    service.delete("services", "web-1", false).await.unwrap();
    assert!(stored(&store, "web-1").await.is_none());
    service.delete("services", "web-1", false).await.unwrap();
}

#[tokio::test]
async fn test_force_delete_drops_document_despite_remote_failure() {
    let store = MemStore::new();
    seed_executor(&store, "c1-marathon", "MARATHONFORC1", "MARATHON").await;

    let failing: ExecutorFactory = Arc::new(|config: ExecutorConfig| {
        async move {
            let mut mock = MockExecutor::new();
            mock.expect_kind().return_const(config.kind.clone());
            mock.expect_name().return_const(config.name.clone());
            mock.expect_subscribe_events().returning(|| None);
            mock.expect_cleanup_before_delete().returning(|| ());
            mock.expect_destroy()
                .returning(|_| Err(SchedulerError::remote("Destroy", "web-1", "backend down")));
            Ok(Arc::new(mock) as Arc<dyn Executor>)
        }
        .boxed()
    });
    let registry = ExecutorRegistry::new(Arc::new(store.clone()), &AppConfig::default());
    registry.register_factory("MARATHON", failing).await;
    registry.start().await.unwrap();

    let volumes = Arc::new(VolumeService::new(Arc::new(store.clone()), "/dice/volume"));
    let service = ServiceGroupService::new(
        Arc::new(store.clone()),
        Sched::new(registry),
        volumes,
        SERVICE_DIR,
    );

    let mut group = web_group("web-1");
    group.executor = "MARATHONFORC1".to_string();
    put_typed(&store, &format!("{SERVICE_DIR}/services/web-1"), &group)
        .await
        .unwrap();

    // Without force the remote failure wins and the document stays.
    let err = service.delete("services", "web-1", false).await.unwrap_err();
    assert!(matches!(err, SchedulerError::Remote { .. }));
    assert!(stored(&store, "web-1").await.is_some());

    service.delete("services", "web-1", true).await.unwrap();
    assert!(stored(&store, "web-1").await.is_none());
}

#[tokio::test]
async fn test_restart_stamps_marker_label() {
    let (store, _volumes, service) = setup().await;
    service.create(web_group("web-1")).await.unwrap();

    let restarted = service.restart("services", "web-1").await.unwrap();
    assert!(restarted.labels.contains_key(LAST_RESTART_TIME_KEY));
    let doc = stored(&store, "web-1").await.unwrap();
    assert!(doc.labels.contains_key(LAST_RESTART_TIME_KEY));
}

#[tokio::test]
async fn test_scale_updates_the_stored_service() {
    let (store, _volumes, service) = setup().await;
    service.create(web_group("web-1")).await.unwrap();

    let scaled = service.scale("services", "web-1", "web", 5).await.unwrap();
    assert_eq!(scaled.services[0].scale, 5);
    let doc = stored(&store, "web-1").await.unwrap();
    assert_eq!(doc.services[0].scale, 5);

    assert!(service
        .scale("services", "web-1", "missing", 2)
        .await
        .is_err());
}

#[tokio::test]
async fn test_cancel_marks_the_group_stopped() {
    let (store, _volumes, service) = setup().await;
    service.create(web_group("web-1")).await.unwrap();

    let status = service.cancel("services", "web-1").await.unwrap();
    assert_eq!(status.status, StatusCode::StoppedOnOK);
    let doc = stored(&store, "web-1").await.unwrap();
    assert_eq!(doc.status_desc.status, StatusCode::StoppedOnOK);
}

#[tokio::test]
async fn test_info_returns_the_live_view() {
    let (_store, _volumes, service) = setup().await;
    service.create(web_group("web-1")).await.unwrap();

    let live = service.info("services", "web-1").await.unwrap();
    assert_eq!(live.id, "web-1");
    assert_eq!(live.services.len(), 1);

    assert!(service.info("services", "ghost").await.is_err());
}

#[tokio::test]
async fn test_create_attaches_volumes_before_dispatch() {
    let (store, volumes, service) = setup().await;
    let volume = volumes
        .create(VolumeCreateConfig {
            volume_type: VolumeType::Local,
            size: 1,
        })
        .await
        .unwrap();

    let mut group = web_group("web-1");
    group.services[0].volumes.push(ServiceVolume {
        id: volume.id.clone(),
        volume_type: VolumeType::Local,
        size: 1,
        container_path: "/data".to_string(),
        host_path: String::new(),
    });
    let created = service.create(group).await.unwrap();
    assert_eq!(
        created.services[0].volumes[0].host_path,
        format!("/data/volumes/{}", volume.id)
    );

    let info = volumes.info(&volume.id).await.unwrap();
    assert_eq!(info.references.len(), 1);

    let doc = stored(&store, "web-1").await.unwrap();
    assert_eq!(
        doc.services[0].volumes[0].host_path,
        format!("/data/volumes/{}", volume.id)
    );
}
