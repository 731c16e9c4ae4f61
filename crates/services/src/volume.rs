//! Volume facade dispatching to drivers by the type encoded in the ID.

use std::collections::HashMap;
use std::sync::Arc;

use dicesched_core::errors::{SchedulerError, SchedulerResult};
use dicesched_core::models::{
    decode_volume_type, AttachDest, VolumeCreateConfig, VolumeInfo, VolumeType,
};
use dicesched_core::traits::{AttachCallback, KvStore, VolumeDriver};

use crate::volume_drivers::KvVolumeDriver;

pub struct VolumeService {
    drivers: HashMap<VolumeType, Arc<dyn VolumeDriver>>,
}

impl VolumeService {
    /// Wires up the built-in local and nas drivers over `store`.
    pub fn new(store: Arc<dyn KvStore>, volume_dir: &str) -> Self {
        let mut drivers: HashMap<VolumeType, Arc<dyn VolumeDriver>> = HashMap::new();
        drivers.insert(
            VolumeType::Local,
            Arc::new(KvVolumeDriver::local(Arc::clone(&store), volume_dir)),
        );
        drivers.insert(
            VolumeType::Nas,
            Arc::new(KvVolumeDriver::nas(store, volume_dir)),
        );
        Self { drivers }
    }

    fn driver(&self, volume_type: VolumeType) -> SchedulerResult<&Arc<dyn VolumeDriver>> {
        self.drivers.get(&volume_type).ok_or_else(|| {
            SchedulerError::Configuration(format!("no driver for volume type {volume_type:?}"))
        })
    }

    fn driver_for_id(&self, id: &str) -> SchedulerResult<&Arc<dyn VolumeDriver>> {
        self.driver(decode_volume_type(id)?)
    }

    pub async fn create(&self, config: VolumeCreateConfig) -> SchedulerResult<VolumeInfo> {
        self.driver(config.volume_type)?.create(config).await
    }

    pub async fn info(&self, id: &str) -> SchedulerResult<VolumeInfo> {
        self.driver_for_id(id)?.info(id).await
    }

    pub async fn attach(&self, id: &str, dest: AttachDest) -> SchedulerResult<AttachCallback> {
        self.driver_for_id(id)?.attach(id, dest).await
    }

    pub async fn unattach(&self, id: &str, dest: AttachDest) -> SchedulerResult<VolumeInfo> {
        self.driver_for_id(id)?.unattach(id, dest).await
    }

    pub async fn delete(&self, id: &str) -> SchedulerResult<()> {
        self.driver_for_id(id)?.delete(id).await
    }
}
