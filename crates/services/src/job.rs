//! Job lifecycle, including the batch entry points.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use dicesched_core::errors::{SchedulerError, SchedulerResult};
use dicesched_core::models::{
    Job, StatusCode, TaskAction, TaskExtra, TaskRequest, TaskResponse, TaskSpec,
};
use dicesched_core::traits::{get_typed, put_typed, KvStore};
use dicesched_dispatcher::Sched;

use crate::clusterutil::{generate_executor_by_cluster, validate_name};

/// Upper bound on one pipeline batch; larger submissions are rejected
/// up front instead of half-run.
const MAX_PIPELINE_JOBS: usize = 10;

pub struct JobService {
    store: Arc<dyn KvStore>,
    sched: Sched,
    job_dir: String,
}

impl JobService {
    pub fn new(store: Arc<dyn KvStore>, sched: Sched, job_dir: impl Into<String>) -> Self {
        Self {
            store,
            sched,
            job_dir: job_dir.into(),
        }
    }

    fn key(&self, namespace: &str, name: &str) -> String {
        format!("{}/{}/{}", self.job_dir, namespace, name)
    }

    pub async fn get(&self, namespace: &str, name: &str) -> SchedulerResult<Job> {
        get_typed::<Job>(self.store.as_ref(), &self.key(namespace, name))
            .await?
            .ok_or_else(|| SchedulerError::NotFound(format!("job {namespace}/{name}")))
    }

    async fn persist(&self, job: &Job) -> SchedulerResult<()> {
        put_typed(self.store.as_ref(), &self.key(&job.namespace, &job.name), job).await
    }

    async fn dispatch(
        &self,
        job: &Job,
        action: TaskAction,
        spec: TaskSpec,
    ) -> SchedulerResult<TaskResponse> {
        let request = TaskRequest {
            executor_kind: job.kind.executor_kind().to_string(),
            executor_name: job.executor.clone(),
            action,
            id: job.full_id(),
            spec,
        };
        Ok(self.sched.send(request).await?.wait().await)
    }

    /// Record the job's desired state; dispatch happens on `start`.
    pub async fn create(&self, mut job: Job) -> SchedulerResult<Job> {
        validate_name("namespace", &job.namespace)?;
        validate_name("name", &job.name)?;
        if job.id.is_empty() {
            job.id = Uuid::new_v4().to_string();
        }
        if job.executor.is_empty() {
            job.executor =
                generate_executor_by_cluster(&job.cluster_name, job.kind.executor_kind());
        }
        job.status = StatusCode::Created;
        job.created_time = Some(Utc::now());
        job.last_modify = Some(Utc::now());
        self.persist(&job).await?;
        debug!(id = %job.full_id(), executor = %job.executor, "job created");
        Ok(job)
    }

    /// Dispatch the stored job to its executor. Failures are recorded on
    /// the document (`StoppedOnFailed` + message) before they propagate.
    pub async fn start(&self, namespace: &str, name: &str) -> SchedulerResult<Job> {
        let mut job = self.get(namespace, name).await?;
        job.last_start_time = Some(Utc::now());

        let response = self
            .dispatch(&job, TaskAction::Create, TaskSpec::Job(Box::new(job.clone())))
            .await?;
        match response.into_result() {
            Ok((_status, _extra)) => {
                job.status = StatusCode::Running;
                job.last_message.clear();
                job.last_modify = Some(Utc::now());
                self.persist(&job).await?;
                info!(id = %job.full_id(), "job started");
                Ok(job)
            }
            Err(err) => {
                job.status = StatusCode::StoppedOnFailed;
                job.last_message = err.to_string();
                job.last_modify = Some(Utc::now());
                self.persist(&job).await?;
                Err(err)
            }
        }
    }

    pub async fn stop(&self, namespace: &str, name: &str) -> SchedulerResult<Job> {
        let mut job = self.get(namespace, name).await?;
        let response = self
            .dispatch(
                &job,
                TaskAction::Destroy,
                TaskSpec::Job(Box::new(job.clone())),
            )
            .await?;
        if let Some(err) = response.error {
            if !err.is_not_found() {
                return Err(err);
            }
        }
        job.status = StatusCode::StoppedOnOK;
        job.last_modify = Some(Utc::now());
        self.persist(&job).await?;
        Ok(job)
    }

    /// Remove the job remotely and drop the document. Absent anywhere
    /// counts as success.
    pub async fn delete(&self, namespace: &str, name: &str) -> SchedulerResult<()> {
        let key = self.key(namespace, name);
        let job = match get_typed::<Job>(self.store.as_ref(), &key).await? {
            Some(job) => job,
            None => return Ok(()),
        };
        let response = self
            .dispatch(
                &job,
                TaskAction::Remove,
                TaskSpec::Job(Box::new(job.clone())),
            )
            .await?;
        if let Some(err) = response.error {
            if !err.is_not_found() {
                return Err(err);
            }
        }
        self.store.remove(&key).await?;
        info!(id = %job.full_id(), "job deleted");
        Ok(())
    }

    pub async fn inspect(&self, namespace: &str, name: &str) -> SchedulerResult<Job> {
        let mut job = self.get(namespace, name).await?;
        let response = self
            .dispatch(&job, TaskAction::Inspect, TaskSpec::None)
            .await?;
        match response.into_result() {
            Ok((_status, TaskExtra::Job(live))) => Ok(*live),
            Ok((_status, _other)) => Ok(job),
            Err(err) if err.is_not_found() => {
                job.status = StatusCode::NotFoundInCluster;
                Ok(job)
            }
            Err(err) => Err(err),
        }
    }

    /// Create and start the jobs one after another, failing fast on the
    /// first error. Jobs started before the failure keep running.
    pub async fn pipeline(&self, jobs: Vec<Job>) -> SchedulerResult<Vec<Job>> {
        if jobs.len() > MAX_PIPELINE_JOBS {
            return Err(SchedulerError::Validation(format!(
                "pipeline batch of {} exceeds the limit of {MAX_PIPELINE_JOBS}",
                jobs.len()
            )));
        }
        let mut started = Vec::with_capacity(jobs.len());
        for job in jobs {
            let job = self.create(job).await?;
            let job = self.start(&job.namespace, &job.name).await?;
            started.push(job);
        }
        Ok(started)
    }

    /// Create and start the jobs in parallel. Per-job failures are
    /// recorded on the documents; the batch itself always completes.
    pub async fn concurrent(&self, jobs: Vec<Job>) -> SchedulerResult<Vec<Job>> {
        let mut created = Vec::with_capacity(jobs.len());
        for job in jobs {
            created.push(self.create(job).await?);
        }

        let starts = created
            .iter()
            .map(|job| self.start(&job.namespace, &job.name));
        let results = futures::future::join_all(starts).await;

        let mut out = Vec::with_capacity(created.len());
        for (job, result) in created.into_iter().zip(results) {
            match result {
                Ok(started) => out.push(started),
                Err(err) => {
                    warn!(id = %job.full_id(), error = %err, "job failed to start");
                    // start() already stamped the failure on the document
                    out.push(self.get(&job.namespace, &job.name).await?);
                }
            }
        }
        Ok(out)
    }
}
