//! Fluent builders for workload fixtures.

use chrono::Utc;

use dicesched_core::models::{
    Job, JobKind, Resources, ScheduleInfo, Service, ServiceGroup,
};

pub struct ServiceGroupBuilder {
    group: ServiceGroup,
}

impl ServiceGroupBuilder {
    pub fn new(namespace: &str, id: &str) -> Self {
        Self {
            group: ServiceGroup {
                id: id.to_string(),
                namespace: namespace.to_string(),
                created_time: Some(Utc::now()),
                ..Default::default()
            },
        }
    }

    pub fn cluster(mut self, name: &str) -> Self {
        self.group.cluster_name = name.to_string();
        self
    }

    pub fn executor(mut self, name: &str) -> Self {
        self.group.executor = name.to_string();
        self
    }

    pub fn force(mut self) -> Self {
        self.group.force = true;
        self
    }

    pub fn label(mut self, key: &str, value: &str) -> Self {
        self.group
            .labels
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn schedule_info(mut self, info: ScheduleInfo) -> Self {
        self.group.schedule_info = info;
        self
    }

    pub fn service(mut self, name: &str, scale: i32) -> Self {
        self.group.services.push(Service {
            name: name.to_string(),
            image: "busybox:latest".to_string(),
            scale,
            resources: Resources {
                cpu: 0.1,
                mem: 128.0,
                ..Default::default()
            },
            ..Default::default()
        });
        self
    }

    pub fn build(self) -> ServiceGroup {
        self.group
    }
}

pub struct JobBuilder {
    job: Job,
}

impl JobBuilder {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            job: Job {
                namespace: namespace.to_string(),
                name: name.to_string(),
                image: "busybox:latest".to_string(),
                cmd: "true".to_string(),
                created_time: Some(Utc::now()),
                ..Default::default()
            },
        }
    }

    pub fn kind(mut self, kind: JobKind) -> Self {
        self.job.kind = kind;
        self
    }

    pub fn cluster(mut self, name: &str) -> Self {
        self.job.cluster_name = name.to_string();
        self
    }

    pub fn executor(mut self, name: &str) -> Self {
        self.job.executor = name.to_string();
        self
    }

    pub fn label(mut self, key: &str, value: &str) -> Self {
        self.job.labels.insert(key.to_string(), value.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.job.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn schedule_info(mut self, info: ScheduleInfo) -> Self {
        self.job.schedule_info = info;
        self
    }

    pub fn build(self) -> Job {
        self.job
    }
}
