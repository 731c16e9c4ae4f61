//! Mock collaborators generated with mockall.

use async_trait::async_trait;
use mockall::mock;
use tokio::sync::mpsc;

use dicesched_core::errors::SchedulerResult;
use dicesched_core::models::{StatusDesc, TaskExtra, TaskSpec};
use dicesched_core::traits::{
    Executor, ExecutorEvent, ResourceInfo, SetNodeLabelsRequest,
};

mock! {
    pub Executor {}

    #[async_trait]
    impl Executor for Executor {
        fn kind(&self) -> &str;
        fn name(&self) -> &str;

        async fn create(&self, spec: TaskSpec) -> SchedulerResult<TaskExtra>;
        async fn update(&self, spec: TaskSpec) -> SchedulerResult<TaskExtra>;
        async fn destroy(&self, spec: TaskSpec) -> SchedulerResult<()>;
        async fn remove(&self, spec: TaskSpec) -> SchedulerResult<()>;
        async fn status(&self, id: &str) -> SchedulerResult<StatusDesc>;
        async fn inspect(&self, id: &str) -> SchedulerResult<TaskExtra>;
        async fn cancel(&self, id: &str) -> SchedulerResult<TaskExtra>;
        async fn precheck(&self, spec: TaskSpec) -> SchedulerResult<StatusDesc>;
        async fn scale(&self, spec: TaskSpec) -> SchedulerResult<TaskExtra>;
        async fn kill_pod(&self, container_id: &str) -> SchedulerResult<()>;
        async fn job_volume_create(&self, spec: TaskSpec) -> SchedulerResult<String>;
        async fn resource_info(&self, brief: bool) -> SchedulerResult<ResourceInfo>;
        async fn set_node_labels(&self, req: SetNodeLabelsRequest) -> SchedulerResult<()>;
        async fn cleanup_before_delete(&self);
        fn subscribe_events(&self) -> Option<mpsc::Receiver<ExecutorEvent>>;
    }
}
