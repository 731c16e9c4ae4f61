//! Workload lifecycle services: service groups, jobs, volumes and
//! cluster provisioning, all speaking to backends through the dispatch
//! pipeline and persisting desired state in the KV store.

pub mod cluster;
pub mod clusterutil;
pub mod job;
pub mod servicegroup;
pub mod volume;
pub mod volume_drivers;

#[cfg(test)]
mod cluster_test;
#[cfg(test)]
mod job_test;
#[cfg(test)]
mod servicegroup_test;
#[cfg(test)]
mod volume_test;

pub use cluster::ClusterService;
pub use job::JobService;
pub use servicegroup::ServiceGroupService;
pub use volume::VolumeService;
