use std::sync::Arc;

use dicesched_core::models::{AttachDest, VolumeCreateConfig, VolumeType};
use dicesched_infrastructure::MemStore;
use dicesched_testing_utils::ServiceGroupBuilder;

use crate::volume::VolumeService;
use crate::volume_drivers::LOCAL_VOLUME_ROOT;

const VOLUME_DIR: &str = "/dice/volume";

fn service() -> VolumeService {
    VolumeService::new(Arc::new(MemStore::new()), VOLUME_DIR)
}

fn dest(service: &str) -> AttachDest {
    AttachDest {
        namespace: "services".to_string(),
        service: service.to_string(),
        path: "/data".to_string(),
    }
}

#[tokio::test]
async fn test_create_and_info_roundtrip() {
    let volumes = service();
    for (volume_type, size) in [(VolumeType::Local, 10), (VolumeType::Nas, 20)] {
        let created = volumes
            .create(VolumeCreateConfig { volume_type, size })
            .await
            .unwrap();
        assert_eq!(created.volume_type, volume_type);
        let info = volumes.info(&created.id).await.unwrap();
        assert_eq!(info.size, size);
        assert!(info.references.is_empty());
    }
}

#[tokio::test]
async fn test_attach_rewrites_host_paths_and_dedupes() {
    let volumes = service();
    let created = volumes
        .create(VolumeCreateConfig {
            volume_type: VolumeType::Local,
            size: 1,
        })
        .await
        .unwrap();

    let callback = volumes.attach(&created.id, dest("web")).await.unwrap();
    let mut group = ServiceGroupBuilder::new("services", "web-group")
        .service("web", 1)
        .build();
    group.services[0].volumes.push(dicesched_core::models::ServiceVolume {
        id: created.id.clone(),
        volume_type: VolumeType::Local,
        size: 1,
        container_path: "/data".to_string(),
        host_path: String::new(),
    });
    callback(&mut group).unwrap();
    assert_eq!(
        group.services[0].volumes[0].host_path,
        format!("{LOCAL_VOLUME_ROOT}/{}", created.id)
    );

    // Second attach to the same destination keeps one reference.
    let _ = volumes.attach(&created.id, dest("web")).await.unwrap();
    let info = volumes.info(&created.id).await.unwrap();
    assert_eq!(info.references.len(), 1);
}

#[tokio::test]
async fn test_unattach_removes_the_reference() {
    let volumes = service();
    let created = volumes
        .create(VolumeCreateConfig {
            volume_type: VolumeType::Nas,
            size: 1,
        })
        .await
        .unwrap();
    let _ = volumes.attach(&created.id, dest("web")).await.unwrap();
    let info = volumes.unattach(&created.id, dest("web")).await.unwrap();
    assert!(info.references.is_empty());
}

#[tokio::test]
async fn test_nas_delete_is_soft() {
    let volumes = service();
    let created = volumes
        .create(VolumeCreateConfig {
            volume_type: VolumeType::Nas,
            size: 1,
        })
        .await
        .unwrap();
    volumes.delete(&created.id).await.unwrap();

    let info = volumes.info(&created.id).await.unwrap();
    assert!(info.deleted_at.is_some());
    // A deleted volume takes no new references.
    assert!(volumes.attach(&created.id, dest("web")).await.is_err());
}

#[tokio::test]
async fn test_local_delete_clears_metadata() {
    let volumes = service();
    let created = volumes
        .create(VolumeCreateConfig {
            volume_type: VolumeType::Local,
            size: 1,
        })
        .await
        .unwrap();
    volumes.delete(&created.id).await.unwrap();
    assert!(volumes.info(&created.id).await.is_err());
}

#[tokio::test]
async fn test_incomplete_destination_is_rejected() {
    let volumes = service();
    let created = volumes
        .create(VolumeCreateConfig {
            volume_type: VolumeType::Local,
            size: 1,
        })
        .await
        .unwrap();
    let incomplete = AttachDest {
        namespace: "services".to_string(),
        service: String::new(),
        path: "/data".to_string(),
    };
    assert!(volumes.attach(&created.id, incomplete).await.is_err());
}
