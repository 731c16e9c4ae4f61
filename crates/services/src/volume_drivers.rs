//! KV-backed volume drivers.
//!
//! Both built-in drivers share one implementation parameterized by the
//! host-path convention and the delete behavior: local volumes live
//! under `/data/volumes/<id>` and deletion clears the metadata, nas
//! volumes live under `/netdata/volumes/<id>` on every node and are
//! soft-deleted so the network share can be reclaimed out of band.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use dicesched_core::errors::{SchedulerError, SchedulerResult};
use dicesched_core::models::{
    new_volume_id, AttachDest, VolumeCreateConfig, VolumeInfo, VolumeType,
};
use dicesched_core::traits::{get_typed, put_typed, AttachCallback, KvStore, VolumeDriver};

pub const LOCAL_VOLUME_ROOT: &str = "/data/volumes";
pub const NAS_VOLUME_ROOT: &str = "/netdata/volumes";

pub struct KvVolumeDriver {
    store: Arc<dyn KvStore>,
    volume_dir: String,
    volume_type: VolumeType,
    host_root: &'static str,
    soft_delete: bool,
}

impl KvVolumeDriver {
    pub fn local(store: Arc<dyn KvStore>, volume_dir: impl Into<String>) -> Self {
        Self {
            store,
            volume_dir: volume_dir.into(),
            volume_type: VolumeType::Local,
            host_root: LOCAL_VOLUME_ROOT,
            soft_delete: false,
        }
    }

    pub fn nas(store: Arc<dyn KvStore>, volume_dir: impl Into<String>) -> Self {
        Self {
            store,
            volume_dir: volume_dir.into(),
            volume_type: VolumeType::Nas,
            host_root: NAS_VOLUME_ROOT,
            soft_delete: true,
        }
    }

    fn key(&self, id: &str) -> String {
        format!("{}/{}", self.volume_dir, id)
    }

    async fn load(&self, id: &str) -> SchedulerResult<VolumeInfo> {
        get_typed::<VolumeInfo>(self.store.as_ref(), &self.key(id))
            .await?
            .ok_or_else(|| SchedulerError::NotFound(format!("volume {id}")))
    }

    async fn persist(&self, info: &VolumeInfo) -> SchedulerResult<()> {
        put_typed(self.store.as_ref(), &self.key(&info.id), info).await
    }
}

#[async_trait]
impl VolumeDriver for KvVolumeDriver {
    fn volume_type(&self) -> VolumeType {
        self.volume_type
    }

    async fn create(&self, config: VolumeCreateConfig) -> SchedulerResult<VolumeInfo> {
        let info = VolumeInfo {
            id: new_volume_id(self.volume_type),
            volume_type: self.volume_type,
            size: config.size,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
            deleted_at: None,
            references: Vec::new(),
        };
        self.persist(&info).await?;
        debug!(id = %info.id, volume_type = ?self.volume_type, "volume created");
        Ok(info)
    }

    async fn info(&self, id: &str) -> SchedulerResult<VolumeInfo> {
        self.load(id).await
    }

    /// Record the reference (at most one per destination) and hand back
    /// the host-path rewrite to run on the outgoing service group.
    async fn attach(&self, id: &str, dest: AttachDest) -> SchedulerResult<AttachCallback> {
        dest.validate()?;
        let mut info = self.load(id).await?;
        if info.deleted_at.is_some() {
            return Err(SchedulerError::NotFound(format!("volume {id} is deleted")));
        }
        if !info.references.contains(&dest) {
            info.references.push(dest.clone());
            info.updated_at = Some(Utc::now());
            self.persist(&info).await?;
        }

        let volume_id = id.to_string();
        let host_path = format!("{}/{}", self.host_root, id);
        Ok(Box::new(move |group| {
            let service = group.service_mut(&dest.service).ok_or_else(|| {
                SchedulerError::NotFound(format!("service {} in group", dest.service))
            })?;
            for volume in &mut service.volumes {
                if volume.id == volume_id {
                    volume.host_path = host_path.clone();
                }
            }
            Ok(())
        }))
    }

    async fn unattach(&self, id: &str, dest: AttachDest) -> SchedulerResult<VolumeInfo> {
        dest.validate()?;
        let mut info = self.load(id).await?;
        info.references.retain(|r| r != &dest);
        info.updated_at = Some(Utc::now());
        self.persist(&info).await?;
        Ok(info)
    }

    async fn delete(&self, id: &str) -> SchedulerResult<()> {
        if self.soft_delete {
            let mut info = self.load(id).await?;
            info.deleted_at = Some(Utc::now());
            self.persist(&info).await?;
        } else {
            self.store.remove(&self.key(id)).await?;
        }
        debug!(%id, soft = self.soft_delete, "volume deleted");
        Ok(())
    }
}
