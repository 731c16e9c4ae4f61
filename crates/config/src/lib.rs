//! Typed application configuration.
//!
//! Loaded from an optional TOML file plus `DICESCHED__`-prefixed
//! environment overrides, e.g. `DICESCHED__DISPATCH__EXECUTOR_POOL_SIZE=16`.

use config::{Config, Environment, File, FileFormat};

use dicesched_core::{SchedulerError, SchedulerResult};

pub mod models;

pub use models::{AppConfig, DispatchConfig, StoreConfig};

impl AppConfig {
    pub fn load(path: Option<&str>) -> SchedulerResult<Self> {
        let mut builder = Config::builder()
            .set_default("dispatch.default_pool_size", 10i64)
            .map_err(config_err)?
            .set_default("dispatch.executor_pool_size", 10i64)
            .map_err(config_err)?
            .set_default("dispatch.pool_queue_factor", 2i64)
            .map_err(config_err)?
            .set_default("dispatch.submit_timeout_secs", 3i64)
            .map_err(config_err)?
            .set_default("store.executor_config_prefix", "/dice/configs/cluster/")
            .map_err(config_err)?
            .set_default("store.service_dir", "/dice/service")
            .map_err(config_err)?
            .set_default("store.job_dir", "/dice/job")
            .map_err(config_err)?
            .set_default("store.volume_dir", "/dice/volume")
            .map_err(config_err)?;

        if let Some(path) = path {
            builder = builder.add_source(File::new(path, FileFormat::Toml).required(false));
        }

        builder = builder.add_source(Environment::with_prefix("DICESCHED").separator("__"));

        let config = builder.build().map_err(config_err)?;
        config.try_deserialize().map_err(config_err)
    }
}

fn config_err(e: config::ConfigError) -> SchedulerError {
    SchedulerError::Configuration(e.to_string())
}
