//! Cluster naming helpers shared across the lifecycle services.

use std::sync::OnceLock;

use regex::Regex;

use dicesched_core::errors::{SchedulerError, SchedulerResult};

/// Derive the executor name serving `kind` workloads on `cluster`:
/// uppercased `<KIND>FOR<CLUSTER>` with non-alphanumerics stripped.
/// Deterministic, so every service derives the same name for the same
/// cluster without coordination.
pub fn generate_executor_by_cluster(cluster: &str, kind: &str) -> String {
    format!("{kind}FOR{cluster}")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("^[a-zA-Z0-9-]+$").unwrap())
}

/// Workload names and namespaces become KV path segments and backend
/// resource names, so the character set is restricted.
pub fn validate_name(field: &str, value: &str) -> SchedulerResult<()> {
    if name_pattern().is_match(value) {
        Ok(())
    } else {
        Err(SchedulerError::Validation(format!(
            "invalid {field}: {value:?} (want ^[a-zA-Z0-9-]+$)"
        )))
    }
}
