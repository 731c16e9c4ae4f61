use std::sync::Arc;

use dicesched_config::AppConfig;
use dicesched_core::errors::SchedulerError;
use dicesched_core::models::{
    ExecutorConfig, ScheduleInfo, StatusCode, TaskAction, TaskRequest, TaskExtra, TaskSpec,
};
use dicesched_core::traits::put_typed;
use dicesched_infrastructure::MemStore;
use dicesched_testing_utils::ServiceGroupBuilder;

use crate::plugins::demo_factory;
use crate::registry::ExecutorRegistry;
use crate::sched::Sched;

async fn sched_with_executor() -> Sched {
    let store = MemStore::new();
    let mut config = ExecutorConfig {
        name: "MARATHONFORC1".to_string(),
        kind: "MARATHON".to_string(),
        cluster_name: "c1".to_string(),
        ..Default::default()
    };
    config
        .options
        .insert("CPU_NUM_QUOTA".to_string(), "-1".to_string());
    put_typed(&store, "/dice/configs/cluster/c1-marathon", &config)
        .await
        .unwrap();

    let registry = ExecutorRegistry::new(Arc::new(store), &AppConfig::default());
    registry.register_factory("MARATHON", demo_factory()).await;
    registry.start().await.unwrap();
    Sched::new(registry)
}

fn request(action: TaskAction, id: &str, spec: TaskSpec) -> TaskRequest {
    TaskRequest {
        executor_kind: "MARATHON".to_string(),
        executor_name: "MARATHONFORC1".to_string(),
        action,
        id: id.to_string(),
        spec,
    }
}

fn web_group() -> TaskSpec {
    let group = ServiceGroupBuilder::new("services", "web")
        .cluster("c1")
        .executor("MARATHONFORC1")
        .service("web", 2)
        .build();
    TaskSpec::ServiceGroup(Box::new(group))
}

#[tokio::test]
async fn test_create_then_status_roundtrip() {
    let sched = sched_with_executor().await;

    let response = sched
        .send(request(TaskAction::Create, "services/web", web_group()))
        .await
        .unwrap()
        .wait()
        .await;
    assert!(response.err().is_none(), "{:?}", response.error);
    assert_eq!(response.status.status, StatusCode::Created);

    let status = sched
        .send(request(TaskAction::Status, "services/web", TaskSpec::None))
        .await
        .unwrap()
        .wait()
        .await;
    assert_eq!(status.status.status, StatusCode::Running);
}

#[tokio::test]
async fn test_placement_policy_is_applied_before_dispatch() {
    let sched = sched_with_executor().await;

    let group = ServiceGroupBuilder::new("services", "tagged")
        .cluster("c1")
        .executor("MARATHONFORC1")
        .schedule_info(ScheduleInfo {
            likes: vec!["project-1".to_string()],
            is_unlocked: true,
            ..Default::default()
        })
        .service("web", 1)
        .build();
    sched
        .send(request(
            TaskAction::Create,
            "services/tagged",
            TaskSpec::ServiceGroup(Box::new(group)),
        ))
        .await
        .unwrap()
        .wait()
        .await;

    let inspected = sched
        .send(request(TaskAction::Inspect, "services/tagged", TaskSpec::None))
        .await
        .unwrap()
        .wait()
        .await;
    match inspected.extra {
        TaskExtra::ServiceGroup(group) => {
            assert!(!group.schedule_info.constraints.is_empty());
            assert_eq!(
                group.extra.get("CPU_NUM_QUOTA").map(String::as_str),
                Some("-1")
            );
        }
        other => panic!("unexpected extra: {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_executor_resolves_with_error() {
    let sched = sched_with_executor().await;
    let response = sched
        .send(TaskRequest {
            executor_kind: "K8S".to_string(),
            executor_name: "K8SFORC9".to_string(),
            action: TaskAction::Status,
            id: "services/web".to_string(),
            spec: TaskSpec::None,
        })
        .await
        .unwrap()
        .wait()
        .await;
    assert!(matches!(
        response.err(),
        Some(SchedulerError::ExecutorNotFound(_))
    ));
}

#[tokio::test]
async fn test_kill_pod_requires_a_container_id() {
    let sched = sched_with_executor().await;
    let response = sched
        .send(request(TaskAction::KillPod, "services/web", TaskSpec::None))
        .await
        .unwrap()
        .wait()
        .await;
    assert!(matches!(
        response.err(),
        Some(SchedulerError::Validation(_))
    ));
}

#[tokio::test]
async fn test_destroy_of_absent_workload_is_success() {
    let sched = sched_with_executor().await;
    let response = sched
        .send(request(TaskAction::Destroy, "services/ghost", web_group()))
        .await
        .unwrap()
        .wait()
        .await;
    assert!(response.err().is_none());
    assert_eq!(response.status.status, StatusCode::StoppedOnOK);
}
