pub mod executor;
pub mod kv_store;
pub mod volume_driver;

pub use executor::{Executor, ExecutorEvent, NodeResource, ResourceInfo, SetNodeLabelsRequest};
pub use kv_store::{get_typed, list_typed, put_typed, KvStore, WatchEvent, WatchEventKind};
pub use volume_driver::{AttachCallback, VolumeDriver};
