//! The executor registry: owns every live backend adapter instance and
//! keeps the set in lockstep with the executor configuration documents
//! in the store.
//!
//! Factories are registered explicitly by the composition root, one per
//! executor kind, before `start`. After `start` the registry is the only
//! writer of its maps; the watch loop applies adds, updates (delete then
//! add) and deletes as configuration documents change.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, info, warn};

use dicesched_config::{AppConfig, DispatchConfig};
use dicesched_core::errors::{SchedulerError, SchedulerResult};
use dicesched_core::models::{ExecutorConfig, ExecutorWholeConfigs};
use dicesched_core::traits::{Executor, ExecutorEvent, KvStore, WatchEvent, WatchEventKind};

/// Builds one adapter instance from its configuration document.
pub type ExecutorFactory = Arc<
    dyn Fn(ExecutorConfig) -> BoxFuture<'static, SchedulerResult<Arc<dyn Executor>>> + Send + Sync,
>;

/// Receives backend events forwarded from executors that expose a
/// native event stream.
pub type EventCallback = Arc<dyn Fn(ExecutorEvent) + Send + Sync>;

pub struct ExecutorRegistry {
    store: Arc<dyn KvStore>,
    config_prefix: String,
    dispatch: DispatchConfig,
    started: AtomicBool,
    default_pool: super::pool::WorkerPool,

    factories: RwLock<HashMap<String, ExecutorFactory>>,
    executors: RwLock<HashMap<String, Arc<dyn Executor>>>,
    configs: RwLock<HashMap<String, ExecutorWholeConfigs>>,
    pools: RwLock<HashMap<String, Arc<super::pool::WorkerPool>>>,
    /// Store key -> executor name, so a delete event (key only) can be
    /// mapped back to the instance it removes.
    keys: RwLock<HashMap<String, String>>,
    /// Dropping the sender stops the executor's event forwarder.
    event_stops: RwLock<HashMap<String, oneshot::Sender<()>>>,
    /// Shared with the forwarder tasks, which outlive any single borrow
    /// of the registry.
    event_callback: Arc<RwLock<Option<EventCallback>>>,
}

impl ExecutorRegistry {
    pub fn new(store: Arc<dyn KvStore>, config: &AppConfig) -> Arc<Self> {
        let dispatch = config.dispatch.clone();
        let default_pool = super::pool::WorkerPool::new(
            "default",
            dispatch.default_pool_size,
            dispatch.default_pool_size * dispatch.pool_queue_factor,
            Duration::from_secs(dispatch.submit_timeout_secs),
        );
        Arc::new(Self {
            store,
            config_prefix: config.store.executor_config_prefix.clone(),
            dispatch,
            started: AtomicBool::new(false),
            default_pool,
            factories: RwLock::new(HashMap::new()),
            executors: RwLock::new(HashMap::new()),
            configs: RwLock::new(HashMap::new()),
            pools: RwLock::new(HashMap::new()),
            keys: RwLock::new(HashMap::new()),
            event_stops: RwLock::new(HashMap::new()),
            event_callback: Arc::new(RwLock::new(None)),
        })
    }

    /// Register the factory for one executor kind. Configuration
    /// documents naming an unregistered kind are skipped with a warning.
    pub async fn register_factory(&self, kind: impl Into<String>, factory: ExecutorFactory) {
        let kind = kind.into();
        debug!(%kind, "executor factory registered");
        self.factories.write().await.insert(kind, factory);
    }

    pub async fn on_event(&self, callback: EventCallback) {
        *self.event_callback.write().await = Some(callback);
    }

    /// Load existing executor configurations and follow changes. Callable
    /// once; a second call is a programming error, not a restart.
    pub async fn start(self: &Arc<Self>) -> SchedulerResult<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(SchedulerError::Internal(
                "executor registry already started".to_string(),
            ));
        }

        // Watch before listing so nothing written in between is lost; a
        // double-delivered add is applied as an update and is harmless.
        let mut watch = self.store.watch_prefix(&self.config_prefix).await?;
        for (key, value) in self.store.list_prefix(&self.config_prefix).await? {
            self.handle_put(&key, value).await;
        }

        let registry = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = watch.recv().await {
                registry.handle_event(event).await;
            }
            debug!("executor config watch closed");
        });
        info!(prefix = %self.config_prefix, "executor registry started");
        Ok(())
    }

    async fn handle_event(&self, event: WatchEvent) {
        match event.kind {
            WatchEventKind::Put { .. } => {
                let Some(value) = event.value else {
                    warn!(key = %event.key, "config put without a value");
                    return;
                };
                self.handle_put(&event.key, value).await;
            }
            WatchEventKind::Delete => {
                let name = self.keys.write().await.remove(&event.key);
                match name {
                    Some(name) => {
                        if let Err(err) = self.remove_executor(&name).await {
                            warn!(key = %event.key, %name, error = %err, "executor delete failed");
                        }
                    }
                    None => debug!(key = %event.key, "delete for unknown executor config"),
                }
            }
        }
    }

    async fn handle_put(&self, key: &str, value: serde_json::Value) {
        let config: ExecutorConfig = match serde_json::from_value(value) {
            Ok(config) => config,
            Err(err) => {
                warn!(%key, error = %err, "malformed executor config, skipping");
                return;
            }
        };
        if config.name.is_empty() || config.kind.is_empty() {
            warn!(%key, "executor config missing name or kind, skipping");
            return;
        }

        // A rename under the same key removes the old instance first.
        let previous = self
            .keys
            .write()
            .await
            .insert(key.to_string(), config.name.clone());
        if let Some(previous) = previous {
            if previous != config.name {
                if let Err(err) = self.remove_executor(&previous).await {
                    warn!(name = %previous, error = %err, "stale executor removal failed");
                }
            }
        }

        if let Err(err) = self.add_or_replace(config).await {
            warn!(%key, error = %err, "executor config apply failed");
        }
    }

    /// Update is delete-then-add: the old instance is fully torn down
    /// before the replacement is built from the new document.
    async fn add_or_replace(&self, config: ExecutorConfig) -> SchedulerResult<()> {
        let name = config.name.clone();
        if self.executors.read().await.contains_key(&name) {
            self.remove_executor(&name).await?;
        }

        let factory = self
            .factories
            .read()
            .await
            .get(&config.kind)
            .cloned()
            .ok_or_else(|| SchedulerError::KindNotRegistered(config.kind.clone()))?;

        let whole = ExecutorWholeConfigs {
            basic_config: config.clone(),
            plus_configs: config.options_plus.clone(),
        };
        let executor = factory(config).await?;

        if let Some(events) = executor.subscribe_events() {
            let stop = self.spawn_event_forwarder(&name, events);
            self.event_stops.write().await.insert(name.clone(), stop);
        }

        let pool = Arc::new(super::pool::WorkerPool::new(
            name.clone(),
            self.dispatch.executor_pool_size,
            self.dispatch.executor_pool_size * self.dispatch.pool_queue_factor,
            Duration::from_secs(self.dispatch.submit_timeout_secs),
        ));
        self.pools.write().await.insert(name.clone(), pool);
        self.configs.write().await.insert(name.clone(), whole);
        info!(
            %name,
            kind = %executor.kind(),
            "executor added"
        );
        self.executors.write().await.insert(name, executor);
        Ok(())
    }

    /// Tear down one executor: stop its event forwarder, drain and stop
    /// its pool, run the adapter's cleanup, drop the instance. In-flight
    /// tasks hold their own `Arc` to the executor and finish normally.
    async fn remove_executor(&self, name: &str) -> SchedulerResult<()> {
        self.event_stops.write().await.remove(name);
        self.configs.write().await.remove(name);
        let pool = self.pools.write().await.remove(name);
        if let Some(pool) = pool {
            pool.shutdown().await;
        }
        let executor = self.executors.write().await.remove(name);
        match executor {
            Some(executor) => {
                executor.cleanup_before_delete().await;
                info!(%name, "executor removed");
                Ok(())
            }
            None => Err(SchedulerError::ExecutorNotFound(name.to_string())),
        }
    }

    fn spawn_event_forwarder(
        &self,
        name: &str,
        mut events: mpsc::Receiver<ExecutorEvent>,
    ) -> oneshot::Sender<()> {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let callback = Arc::clone(&self.event_callback);
        let name = name.to_string();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    event = events.recv() => match event {
                        Some(event) => {
                            let callback = callback.read().await.clone();
                            match callback {
                                Some(callback) => callback(event),
                                None => debug!(executor = %event.executor, "executor event dropped, no listener"),
                            }
                        }
                        None => break,
                    }
                }
            }
            debug!(executor = %name, "event forwarder stopped");
        });
        stop_tx
    }

    pub async fn get(&self, name: &str) -> SchedulerResult<Arc<dyn Executor>> {
        self.executors
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| SchedulerError::ExecutorNotFound(name.to_string()))
    }

    /// Exact name match first; otherwise the first live executor of the
    /// kind (by name, for determinism).
    pub async fn find(&self, name: &str, kind: &str) -> SchedulerResult<Arc<dyn Executor>> {
        let executors = self.executors.read().await;
        if let Some(executor) = executors.get(name) {
            return Ok(Arc::clone(executor));
        }
        executors
            .values()
            .filter(|e| e.kind() == kind)
            .min_by(|a, b| a.name().cmp(b.name()))
            .cloned()
            .ok_or_else(|| SchedulerError::ExecutorNotFound(format!("{name} (kind {kind})")))
    }

    /// Every live executor of the kind, in name order.
    pub async fn get_by_kind(&self, kind: &str) -> Vec<Arc<dyn Executor>> {
        let mut executors: Vec<_> = self
            .executors
            .read()
            .await
            .values()
            .filter(|e| e.kind() == kind)
            .cloned()
            .collect();
        executors.sort_by(|a, b| a.name().cmp(b.name()));
        executors
    }

    pub async fn list(&self) -> Vec<Arc<dyn Executor>> {
        self.executors.read().await.values().cloned().collect()
    }

    pub async fn configs_of(&self, name: &str) -> SchedulerResult<ExecutorWholeConfigs> {
        self.configs
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| SchedulerError::ExecutorConfigNotFound(name.to_string()))
    }

    /// The executor's dedicated pool, or the shared default for names
    /// without one (including not-yet-registered executors).
    pub async fn pool(&self, name: &str) -> Option<Arc<super::pool::WorkerPool>> {
        self.pools.read().await.get(name).cloned()
    }

    pub(crate) fn default_pool(&self) -> &super::pool::WorkerPool {
        &self.default_pool
    }
}
