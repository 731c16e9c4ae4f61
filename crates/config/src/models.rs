use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dispatch: DispatchConfig,
    pub store: StoreConfig,
}

/// Worker-pool and submission knobs for the dispatch pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Size of the shared fallback pool.
    pub default_pool_size: usize,
    /// Size of each executor's dedicated pool.
    pub executor_pool_size: usize,
    /// Queue capacity = pool size * this factor.
    pub pool_queue_factor: usize,
    /// How long `Sched::send` waits for a pool slot before failing fast.
    /// Deliberately much shorter than typical caller deadlines.
    pub submit_timeout_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_pool_size: 10,
            executor_pool_size: 10,
            pool_queue_factor: 2,
            submit_timeout_secs: 3,
        }
    }
}

/// KV key layout. These paths are a compatibility surface; changing them
/// breaks existing stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub executor_config_prefix: String,
    pub service_dir: String,
    pub job_dir: String,
    pub volume_dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            executor_config_prefix: "/dice/configs/cluster/".to_string(),
            service_dir: "/dice/service".to_string(),
            job_dir: "/dice/job".to_string(),
            volume_dir: "/dice/volume".to_string(),
        }
    }
}
