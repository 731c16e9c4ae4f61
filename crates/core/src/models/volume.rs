use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{SchedulerError, SchedulerResult};

/// Hex of "local" / "nas". A volume ID starts with the prefix of its
/// type, so decoding an ID back to its type needs no side lookup.
const LOCAL_VOLUME_HEX_PREFIX: &str = "6c6f63616c";
const NAS_VOLUME_HEX_PREFIX: &str = "6e6173";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeType {
    #[default]
    Local,
    Nas,
}

impl VolumeType {
    pub fn hex_prefix(&self) -> &'static str {
        match self {
            VolumeType::Local => LOCAL_VOLUME_HEX_PREFIX,
            VolumeType::Nas => NAS_VOLUME_HEX_PREFIX,
        }
    }

    pub fn from_str_name(s: &str) -> SchedulerResult<Self> {
        match s {
            "local" => Ok(VolumeType::Local),
            "nas" => Ok(VolumeType::Nas),
            other => Err(SchedulerError::Validation(format!(
                "unknown volume type: {other}"
            ))),
        }
    }
}

/// Mint a fresh volume ID for `t`: type prefix + random suffix.
pub fn new_volume_id(t: VolumeType) -> String {
    format!("{}{}", t.hex_prefix(), Uuid::new_v4().simple())
}

/// Recover the volume type from a type-prefixed ID.
pub fn decode_volume_type(id: &str) -> SchedulerResult<VolumeType> {
    if id.starts_with(LOCAL_VOLUME_HEX_PREFIX) {
        Ok(VolumeType::Local)
    } else if id.starts_with(NAS_VOLUME_HEX_PREFIX) {
        Ok(VolumeType::Nas)
    } else {
        Err(SchedulerError::Validation(format!(
            "volume id {id} carries no known type prefix"
        )))
    }
}

/// Where a volume is mounted: one (namespace, service, container path)
/// triple. Reference lists hold at most one entry per destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachDest {
    pub namespace: String,
    pub service: String,
    pub path: String,
}

impl AttachDest {
    pub fn validate(&self) -> SchedulerResult<()> {
        if self.namespace.is_empty() || self.service.is_empty() || self.path.is_empty() {
            return Err(SchedulerError::Validation(format!(
                "incomplete attach destination: namespace={}, service={}, path={}",
                self.namespace, self.service, self.path
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeCreateConfig {
    #[serde(rename = "type")]
    pub volume_type: VolumeType,
    pub size: i64,
}

/// Volume metadata, persisted under `/dice/volume/<id>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub volume_type: VolumeType,
    pub size: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Set on soft delete (nas volumes); local deletion clears metadata.
    pub deleted_at: Option<DateTime<Utc>>,
    pub references: Vec<AttachDest>,
}
