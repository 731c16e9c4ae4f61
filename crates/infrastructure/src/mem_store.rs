use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use dicesched_core::traits::{KvStore, WatchEvent, WatchEventKind};
use dicesched_core::SchedulerResult;

const WATCH_CHANNEL_CAPACITY: usize = 64;

struct Watcher {
    prefix: String,
    tx: mpsc::Sender<WatchEvent>,
}

struct Inner {
    data: BTreeMap<String, Value>,
    watchers: Vec<Watcher>,
}

/// In-memory KV store with prefix watch, modeled after the etcd-style
/// store the scheduler runs against in production. Events are fanned out
/// to watchers in modification order; a watcher whose receiver is gone
/// is dropped on the next notification.
#[derive(Clone)]
pub struct MemStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                data: BTreeMap::new(),
                watchers: Vec::new(),
            })),
        }
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn notify(&mut self, event: WatchEvent) {
        self.watchers.retain(|w| {
            if !event.key.starts_with(&w.prefix) {
                return true;
            }
            match w.tx.try_send(event.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    // Slow watcher; keep it but drop this event.
                    debug!(prefix = %w.prefix, "watch channel full, dropping event");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            }
        });
    }
}

#[async_trait]
impl KvStore for MemStore {
    async fn get(&self, key: &str) -> SchedulerResult<Option<Value>> {
        let inner = self.inner.lock().await;
        Ok(inner.data.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> SchedulerResult<()> {
        let mut inner = self.inner.lock().await;
        let created = inner.data.insert(key.to_string(), value.clone()).is_none();
        inner.notify(WatchEvent {
            kind: WatchEventKind::Put { created },
            key: key.to_string(),
            value: Some(value),
        });
        Ok(())
    }

    async fn remove(&self, key: &str) -> SchedulerResult<Option<Value>> {
        let mut inner = self.inner.lock().await;
        let removed = inner.data.remove(key);
        if removed.is_some() {
            inner.notify(WatchEvent {
                kind: WatchEventKind::Delete,
                key: key.to_string(),
                value: None,
            });
        }
        Ok(removed)
    }

    async fn list_prefix(&self, prefix: &str) -> SchedulerResult<Vec<(String, Value)>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .data
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn watch_prefix(&self, prefix: &str) -> SchedulerResult<mpsc::Receiver<WatchEvent>> {
        let (tx, rx) = mpsc::channel(WATCH_CHANNEL_CAPACITY);
        let mut inner = self.inner.lock().await;
        inner.watchers.push(Watcher {
            prefix: prefix.to_string(),
            tx,
        });
        Ok(rx)
    }
}
