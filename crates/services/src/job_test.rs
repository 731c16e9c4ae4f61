use std::sync::Arc;

use dicesched_config::AppConfig;
use dicesched_core::errors::SchedulerError;
use dicesched_core::models::{ExecutorConfig, Job, JobKind, StatusCode};
use dicesched_core::traits::{get_typed, put_typed};
use dicesched_dispatcher::plugins::demo_factory;
use dicesched_dispatcher::{ExecutorRegistry, Sched};
use dicesched_infrastructure::MemStore;
use dicesched_testing_utils::JobBuilder;

use crate::job::JobService;

const PREFIX: &str = "/dice/configs/cluster/";
const JOB_DIR: &str = "/dice/job";

async fn setup() -> (MemStore, JobService) {
    let store = MemStore::new();
    let config = ExecutorConfig {
        name: "METRONOMEFORC1".to_string(),
        kind: "METRONOME".to_string(),
        cluster_name: "c1".to_string(),
        ..Default::default()
    };
    put_typed(&store, &format!("{PREFIX}c1-metronome"), &config)
        .await
        .unwrap();

    let registry = ExecutorRegistry::new(Arc::new(store.clone()), &AppConfig::default());
    registry.register_factory("METRONOME", demo_factory()).await;
    // K8SJOB is deliberately left unregistered so kind-mapped jobs can
    // fail to start in the batch tests.
    registry.start().await.unwrap();

    let service = JobService::new(Arc::new(store.clone()), Sched::new(registry), JOB_DIR);
    (store, service)
}

fn batch_job(name: &str) -> Job {
    JobBuilder::new("batch", name).cluster("c1").build()
}

async fn stored(store: &MemStore, name: &str) -> Option<Job> {
    get_typed::<Job>(store, &format!("{JOB_DIR}/batch/{name}"))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_create_assigns_identity_and_executor() {
    let (store, service) = setup().await;
    let created = service.create(batch_job("compute-1")).await.unwrap();

    assert!(!created.id.is_empty());
    assert_eq!(created.executor, "METRONOMEFORC1");
    assert_eq!(created.status, StatusCode::Created);
    assert!(stored(&store, "compute-1").await.is_some());
}

#[tokio::test]
async fn test_start_dispatches_and_marks_running() {
    let (store, service) = setup().await;
    service.create(batch_job("compute-1")).await.unwrap();

    let started = service.start("batch", "compute-1").await.unwrap();
    assert_eq!(started.status, StatusCode::Running);
    assert!(started.last_start_time.is_some());
    assert_eq!(stored(&store, "compute-1").await.unwrap().status, StatusCode::Running);

    assert!(matches!(
        service.start("batch", "ghost").await,
        Err(SchedulerError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_start_failure_is_recorded_on_the_document() {
    let (store, service) = setup().await;
    // K8SJob maps to the unregistered K8SJOB executor kind.
    let job = JobBuilder::new("batch", "k8s-1")
        .cluster("c1")
        .kind(JobKind::K8SJob)
        .build();
    service.create(job).await.unwrap();

    assert!(service.start("batch", "k8s-1").await.is_err());
    let doc = stored(&store, "k8s-1").await.unwrap();
    assert_eq!(doc.status, StatusCode::StoppedOnFailed);
    assert!(!doc.last_message.is_empty());
}

#[tokio::test]
async fn test_stop_and_delete() {
    let (store, service) = setup().await;
    service.create(batch_job("compute-1")).await.unwrap();
    service.start("batch", "compute-1").await.unwrap();

    let stopped = service.stop("batch", "compute-1").await.unwrap();
    assert_eq!(stopped.status, StatusCode::StoppedOnOK);

    service.delete("batch", "compute-1").await.unwrap();
    assert!(stored(&store, "compute-1").await.is_none());
    // Absent everywhere: still success.
    service.delete("batch", "compute-1").await.unwrap();
}

#[tokio::test]
async fn test_inspect_returns_the_live_job() {
    let (_store, service) = setup().await;
    service.create(batch_job("compute-1")).await.unwrap();
    service.start("batch", "compute-1").await.unwrap();

    let live = service.inspect("batch", "compute-1").await.unwrap();
    assert_eq!(live.name, "compute-1");
}

#[tokio::test]
async fn test_pipeline_caps_the_batch() {
    let (_store, service) = setup().await;
    let jobs = (0..11).map(|i| batch_job(&format!("j-{i}"))).collect();
    assert!(matches!(
        service.pipeline(jobs).await,
        Err(SchedulerError::Validation(_))
    ));
}

#[tokio::test]
async fn test_pipeline_fails_fast() {
    let (store, service) = setup().await;
    let bad = JobBuilder::new("batch", "bad")
        .cluster("c1")
        .kind(JobKind::K8SJob)
        .build();
    let jobs = vec![batch_job("first"), bad, batch_job("never")];

    assert!(service.pipeline(jobs).await.is_err());
    // The first job started and keeps running; the third was never
    // reached.
    assert_eq!(stored(&store, "first").await.unwrap().status, StatusCode::Running);
    assert!(stored(&store, "never").await.is_none());
}

#[tokio::test]
async fn test_concurrent_records_failures_without_aborting() {
    let (_store, service) = setup().await;
    let bad = JobBuilder::new("batch", "bad")
        .cluster("c1")
        .kind(JobKind::K8SJob)
        .build();
    let jobs = vec![batch_job("a"), bad, batch_job("b")];

    let results = service.concurrent(jobs).await.unwrap();
    assert_eq!(results.len(), 3);
    let by_name = |name: &str| results.iter().find(|j| j.name == name).unwrap();
    assert_eq!(by_name("a").status, StatusCode::Running);
    assert_eq!(by_name("b").status, StatusCode::Running);
    assert_eq!(by_name("bad").status, StatusCode::StoppedOnFailed);
    assert!(!by_name("bad").last_message.is_empty());
}
