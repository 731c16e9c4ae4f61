//! ServiceGroup lifecycle.
//!
//! The KV document under `/dice/service/<namespace>/<name>` is the
//! desired state and is always written before the remote call, so a
//! crashed or failed dispatch leaves a record to reconcile from. There
//! is no rollback on failure.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use dicesched_core::errors::{SchedulerError, SchedulerResult};
use dicesched_core::labels::{
    LABEL_EXCLUDE_TAGS, LABEL_MATCH_TAGS, LABEL_SERVICE_TYPE, LAST_CONFIG_UPDATE_TIME_KEY,
    LAST_RESTART_TIME_KEY, TAG_LOCKED, TAG_PLATFORM, TAG_SERVICE_STATEFUL, TAG_SERVICE_STATELESS,
};
use dicesched_core::models::{
    AttachDest, ServiceGroup, StatusCode, StatusDesc, TaskAction, TaskExtra, TaskRequest,
    TaskResponse, TaskSpec, SERVICE_KIND_MARATHON,
};
use dicesched_core::traits::{get_typed, put_typed, KvStore};
use dicesched_dispatcher::Sched;

use crate::clusterutil::{generate_executor_by_cluster, validate_name};
use crate::volume::VolumeService;

pub struct ServiceGroupService {
    store: Arc<dyn KvStore>,
    sched: Sched,
    volumes: Arc<VolumeService>,
    service_dir: String,
}

impl ServiceGroupService {
    pub fn new(
        store: Arc<dyn KvStore>,
        sched: Sched,
        volumes: Arc<VolumeService>,
        service_dir: impl Into<String>,
    ) -> Self {
        Self {
            store,
            sched,
            volumes,
            service_dir: service_dir.into(),
        }
    }

    fn key(&self, namespace: &str, name: &str) -> String {
        format!("{}/{}/{}", self.service_dir, namespace, name)
    }

    async fn load(&self, namespace: &str, name: &str) -> SchedulerResult<ServiceGroup> {
        get_typed::<ServiceGroup>(self.store.as_ref(), &self.key(namespace, name))
            .await?
            .ok_or_else(|| SchedulerError::NotFound(format!("servicegroup {namespace}/{name}")))
    }

    async fn persist(&self, group: &ServiceGroup) -> SchedulerResult<()> {
        put_typed(
            self.store.as_ref(),
            &self.key(&group.namespace, &group.id),
            group,
        )
        .await
    }

    async fn dispatch(
        &self,
        group: &ServiceGroup,
        action: TaskAction,
        spec: TaskSpec,
    ) -> SchedulerResult<TaskResponse> {
        let request = TaskRequest {
            executor_kind: SERVICE_KIND_MARATHON.to_string(),
            executor_name: group.executor.clone(),
            action,
            id: format!("{}/{}", group.namespace, group.id),
            spec,
        };
        Ok(self.sched.send(request).await?.wait().await)
    }

    /// Attach every referenced volume and run the drivers' host-path
    /// rewrites on the group before it goes out.
    async fn attach_volumes(&self, group: &mut ServiceGroup) -> SchedulerResult<()> {
        let mut callbacks = Vec::new();
        for service in &group.services {
            for volume in &service.volumes {
                if volume.id.is_empty() {
                    continue;
                }
                let dest = AttachDest {
                    namespace: group.namespace.clone(),
                    service: service.name.clone(),
                    path: volume.container_path.clone(),
                };
                callbacks.push(self.volumes.attach(&volume.id, dest).await?);
            }
        }
        for callback in callbacks {
            callback(group)?;
        }
        Ok(())
    }

    pub async fn create(&self, mut group: ServiceGroup) -> SchedulerResult<ServiceGroup> {
        self.prepare(&mut group)?;
        self.attach_volumes(&mut group).await?;
        let now = Utc::now();
        group.created_time = Some(now);
        group.last_modified_time = Some(now);
        group.status_desc = StatusDesc::new(StatusCode::Created, "created");
        self.persist(&group).await?;

        let response = self
            .dispatch(
                &group,
                TaskAction::Create,
                TaskSpec::ServiceGroup(Box::new(group.clone())),
            )
            .await?;
        let (status, _extra) = response.into_result()?;
        group.status_desc = status;
        self.persist(&group).await?;
        info!(namespace = %group.namespace, name = %group.id, "servicegroup created");
        Ok(group)
    }

    pub async fn update(&self, group: ServiceGroup) -> SchedulerResult<ServiceGroup> {
        self.redeploy(group, None).await
    }

    /// Redeploy in place, stamping the restart marker label.
    pub async fn restart(&self, namespace: &str, name: &str) -> SchedulerResult<ServiceGroup> {
        let group = self.load(namespace, name).await?;
        self.redeploy(group, Some(LAST_RESTART_TIME_KEY)).await
    }

    /// Push configuration changes (env and the like) to the running
    /// group, stamping the config-update marker label.
    pub async fn config_update(&self, group: ServiceGroup) -> SchedulerResult<ServiceGroup> {
        self.redeploy(group, Some(LAST_CONFIG_UPDATE_TIME_KEY)).await
    }

    async fn redeploy(
        &self,
        mut group: ServiceGroup,
        stamp: Option<&str>,
    ) -> SchedulerResult<ServiceGroup> {
        let existing = self.load(&group.namespace, &group.id).await?;
        group.created_time = existing.created_time;
        self.prepare(&mut group)?;
        self.attach_volumes(&mut group).await?;
        let now = Utc::now();
        group.last_modified_time = Some(now);
        if let Some(label) = stamp {
            group.labels.insert(label.to_string(), now.to_rfc3339());
        }
        self.persist(&group).await?;

        let response = self
            .dispatch(
                &group,
                TaskAction::Update,
                TaskSpec::ServiceGroup(Box::new(group.clone())),
            )
            .await?;
        let (status, _extra) = response.into_result()?;
        group.status_desc = status;
        self.persist(&group).await?;
        Ok(group)
    }

    pub async fn cancel(&self, namespace: &str, name: &str) -> SchedulerResult<StatusDesc> {
        let mut group = self.load(namespace, name).await?;
        let response = self
            .dispatch(&group, TaskAction::Cancel, TaskSpec::None)
            .await?;
        let (status, _extra) = response.into_result()?;
        group.status_desc = status.clone();
        group.last_modified_time = Some(Utc::now());
        self.persist(&group).await?;
        Ok(status)
    }

    pub async fn scale(
        &self,
        namespace: &str,
        name: &str,
        service: &str,
        scale: i32,
    ) -> SchedulerResult<ServiceGroup> {
        let mut group = self.load(namespace, name).await?;
        group
            .service_mut(service)
            .ok_or_else(|| SchedulerError::NotFound(format!("service {service} in {namespace}/{name}")))?
            .scale = scale;
        group.last_modified_time = Some(Utc::now());
        self.persist(&group).await?;

        let response = self
            .dispatch(
                &group,
                TaskAction::Scale,
                TaskSpec::ServiceGroup(Box::new(group.clone())),
            )
            .await?;
        response.into_result()?;
        Ok(group)
    }

    /// Dry-run placement against the target executor; nothing persisted.
    pub async fn precheck(&self, mut group: ServiceGroup) -> SchedulerResult<StatusDesc> {
        self.prepare(&mut group)?;
        let response = self
            .dispatch(
                &group,
                TaskAction::Precheck,
                TaskSpec::ServiceGroup(Box::new(group.clone())),
            )
            .await?;
        let (status, _extra) = response.into_result()?;
        Ok(status)
    }

    pub async fn kill_pod(
        &self,
        namespace: &str,
        name: &str,
        container_id: &str,
    ) -> SchedulerResult<()> {
        let group = self.load(namespace, name).await?;
        let response = self
            .dispatch(
                &group,
                TaskAction::KillPod,
                TaskSpec::ContainerId(container_id.to_string()),
            )
            .await?;
        response.into_result()?;
        Ok(())
    }

    /// Delete the group. Remote not-found counts as success; `force`
    /// drops the desired state even when the remote destroy fails.
    pub async fn delete(&self, namespace: &str, name: &str, force: bool) -> SchedulerResult<()> {
        let key = self.key(namespace, name);
        let group = match get_typed::<ServiceGroup>(self.store.as_ref(), &key).await? {
            Some(group) => group,
            None => {
                debug!(%namespace, %name, "servicegroup already gone");
                return Ok(());
            }
        };

        let response = self
            .dispatch(
                &group,
                TaskAction::Destroy,
                TaskSpec::ServiceGroup(Box::new(group.clone())),
            )
            .await?;
        if let Some(err) = response.error {
            if err.is_not_found() {
                debug!(%namespace, %name, "remote workload already gone");
            } else if force || group.force {
                warn!(%namespace, %name, error = %err, "forced delete despite remote failure");
            } else {
                return Err(err);
            }
        }
        self.store.remove(&key).await?;
        info!(%namespace, %name, "servicegroup deleted");
        Ok(())
    }

    /// Live view: the stored document refreshed by a remote inspect.
    pub async fn info(&self, namespace: &str, name: &str) -> SchedulerResult<ServiceGroup> {
        let mut group = self.load(namespace, name).await?;
        let response = self
            .dispatch(&group, TaskAction::Inspect, TaskSpec::None)
            .await?;
        match response.into_result() {
            Ok((_status, TaskExtra::ServiceGroup(live))) => Ok(*live),
            Ok((_status, _other)) => Ok(group),
            Err(err) if err.is_not_found() => {
                group.status_desc = StatusDesc::new(StatusCode::NotFoundInCluster, err.to_string());
                Ok(group)
            }
            Err(err) => Err(err),
        }
    }

    fn prepare(&self, group: &mut ServiceGroup) -> SchedulerResult<()> {
        validate_name("namespace", &group.namespace)?;
        validate_name("name", &group.id)?;
        for service in &group.services {
            validate_name("service name", &service.name)?;
        }
        if group.executor.is_empty() {
            group.executor =
                generate_executor_by_cluster(&group.cluster_name, SERVICE_KIND_MARATHON);
        }
        apply_scheduling_tags(group);
        Ok(())
    }
}

/// Append the default match/exclude tag labels and fold them into the
/// group's placement intent. Locked and platform exclusion is implicit
/// in the constraint compiler, so only extra excludes become unlikes.
fn apply_scheduling_tags(group: &mut ServiceGroup) {
    let stateful = group.labels.get(LABEL_SERVICE_TYPE).map(String::as_str) == Some("stateful");
    let default_tag = if stateful {
        TAG_SERVICE_STATEFUL
    } else {
        TAG_SERVICE_STATELESS
    };
    let match_tags = group
        .labels
        .entry(LABEL_MATCH_TAGS.to_string())
        .or_insert_with(|| default_tag.to_string())
        .clone();
    let exclude_tags = group
        .labels
        .entry(LABEL_EXCLUDE_TAGS.to_string())
        .or_insert_with(|| format!("{TAG_LOCKED},{TAG_PLATFORM}"))
        .clone();

    group.schedule_info.is_unlocked = true;
    for tag in match_tags.split(',').filter(|t| !t.is_empty()) {
        if !group.schedule_info.likes.iter().any(|l| l == tag) {
            group.schedule_info.likes.push(tag.to_string());
        }
    }
    for tag in exclude_tags.split(',').filter(|t| !t.is_empty()) {
        if tag == TAG_LOCKED || tag == TAG_PLATFORM {
            continue;
        }
        if !group.schedule_info.unlikes.iter().any(|u| u == tag) {
            group.schedule_info.unlikes.push(tag.to_string());
        }
    }
}
