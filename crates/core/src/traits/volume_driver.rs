use async_trait::async_trait;

use crate::errors::SchedulerResult;
use crate::models::{AttachDest, ServiceGroup, VolumeCreateConfig, VolumeInfo, VolumeType};

/// Mutates a resolved service group right before dispatch, rewriting the
/// matching service's volume host paths to the driver's convention.
pub type AttachCallback = Box<dyn FnOnce(&mut ServiceGroup) -> SchedulerResult<()> + Send>;

/// One volume backend (local disk, network-attached, ...). Drivers own
/// metadata persistence for their volumes; physical provisioning and
/// cleanup belong to the cluster backend.
#[async_trait]
pub trait VolumeDriver: Send + Sync {
    fn volume_type(&self) -> VolumeType;

    async fn create(&self, config: VolumeCreateConfig) -> SchedulerResult<VolumeInfo>;

    async fn info(&self, id: &str) -> SchedulerResult<VolumeInfo>;

    async fn attach(&self, id: &str, dest: AttachDest) -> SchedulerResult<AttachCallback>;

    async fn unattach(&self, id: &str, dest: AttachDest) -> SchedulerResult<VolumeInfo>;

    async fn delete(&self, id: &str) -> SchedulerResult<()>;
}
