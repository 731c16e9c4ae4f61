use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Arg, Command};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dicesched_config::AppConfig;
use dicesched_core::models::{
    JOB_KIND_FLINK, JOB_KIND_K8S, JOB_KIND_METRONOME, JOB_KIND_SPARK, KIND_LOCAL_DOCKER,
    SERVICE_KIND_EDAS, SERVICE_KIND_K8S, SERVICE_KIND_MARATHON,
};
use dicesched_dispatcher::plugins::demo_factory;
use dicesched_dispatcher::ExecutorRegistry;
use dicesched_infrastructure::MemStore;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("dice-scheduler")
        .version("1.0.0")
        .about("Cluster-agnostic workload scheduler")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config/dice-scheduler.toml"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level")
                .value_parser(["trace", "debug", "info", "warn", "error"])
                .default_value("info"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("Log format")
                .value_parser(["json", "pretty"])
                .default_value("pretty"),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").expect("has default");
    let log_level = matches.get_one::<String>("log-level").expect("has default");
    let log_format = matches.get_one::<String>("log-format").expect("has default");

    init_logging(log_level, log_format)?;
    info!(config = %config_path, "starting dice-scheduler");

    let config = AppConfig::load(Some(config_path))
        .with_context(|| format!("failed to load configuration from {config_path}"))?;

    // The embedded store keeps the daemon self-contained; swap in an
    // etcd-backed KvStore for multi-node deployments.
    let store = Arc::new(MemStore::new());

    let registry = ExecutorRegistry::new(store, &config);
    for kind in [
        SERVICE_KIND_MARATHON,
        SERVICE_KIND_K8S,
        SERVICE_KIND_EDAS,
        JOB_KIND_METRONOME,
        JOB_KIND_K8S,
        JOB_KIND_FLINK,
        JOB_KIND_SPARK,
        KIND_LOCAL_DOCKER,
    ] {
        registry.register_factory(kind, demo_factory()).await;
    }
    registry
        .on_event(Arc::new(|event| {
            info!(executor = %event.executor, workload = %event.workload_id, "executor event");
        }))
        .await;
    registry
        .start()
        .await
        .context("failed to start the executor registry")?;

    // The lifecycle services (dicesched-services) are request-scoped and
    // belong to the transport layer embedding this daemon; the binary
    // runs the registry and its dispatch pools.
    info!(
        executors = registry.list().await.len(),
        "scheduler ready, waiting for work"
    );
    wait_for_shutdown_signal().await;
    info!("shutdown signal received, exiting");
    Ok(())
}

fn init_logging(log_level: &str, log_format: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match log_format {
        "json" => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .context("failed to initialize json logging")?,
        "pretty" => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()
            .context("failed to initialize pretty logging")?,
        other => return Err(anyhow::anyhow!("unsupported log format: {other}")),
    }
    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                ctrl_c.await;
                return;
            }
        };
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    ctrl_c.await;
}
