//! The configuration/state store seam.
//!
//! The real store is an external collaborator (etcd-style) injected into
//! the registry and the lifecycle services; it only has to offer
//! get/put/remove, prefix iteration, and prefix watch. Documents are
//! read-modify-written without optimistic concurrency; concurrent
//! updates to the same key are last-writer-wins by design.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::errors::{SchedulerError, SchedulerResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    /// `created` distinguishes an add from an update of an existing key.
    Put { created: bool },
    Delete,
}

#[derive(Debug, Clone)]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    pub key: String,
    /// The new value for puts, `None` for deletes.
    pub value: Option<Value>,
}

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> SchedulerResult<Option<Value>>;

    async fn put(&self, key: &str, value: Value) -> SchedulerResult<()>;

    /// Returns the removed value, `None` if the key was absent.
    async fn remove(&self, key: &str) -> SchedulerResult<Option<Value>>;

    /// All live (key, value) pairs under `prefix`, in key order.
    async fn list_prefix(&self, prefix: &str) -> SchedulerResult<Vec<(String, Value)>>;

    /// Subscribe to changes under `prefix`. The receiver stays live until
    /// dropped; events arrive in modification order.
    async fn watch_prefix(&self, prefix: &str) -> SchedulerResult<mpsc::Receiver<WatchEvent>>;
}

pub async fn get_typed<T: DeserializeOwned>(
    store: &dyn KvStore,
    key: &str,
) -> SchedulerResult<Option<T>> {
    match store.get(key).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

pub async fn put_typed<T: Serialize>(
    store: &dyn KvStore,
    key: &str,
    value: &T,
) -> SchedulerResult<()> {
    store.put(key, serde_json::to_value(value)?).await
}

pub async fn list_typed<T: DeserializeOwned>(
    store: &dyn KvStore,
    prefix: &str,
) -> SchedulerResult<Vec<(String, T)>> {
    let mut out = Vec::new();
    for (key, value) in store.list_prefix(prefix).await? {
        let typed = serde_json::from_value(value).map_err(|e| {
            SchedulerError::Store(format!("malformed document at {key}: {e}"))
        })?;
        out.push((key, typed));
    }
    Ok(out)
}
