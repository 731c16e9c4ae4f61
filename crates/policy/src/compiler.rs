use std::collections::HashMap;

use tracing::debug;

use dicesched_core::labels::{DCOS_ATTRIBUTE, OPT_CPU_NUM_QUOTA, TAG_ANY, TAG_LOCKED, TAG_PLATFORM};
use dicesched_core::models::{ExecutorWholeConfigs, ScheduleInfo};

use crate::constraints::{tag_prefix, tag_word, Constraint};

/// Labels consulted when picking org/workspace option overlays out of
/// the executor's plus-configs.
const LABEL_ORG: &str = "DICE_ORG_NAME";
const LABEL_WORKSPACE: &str = "DICE_WORKSPACE";

#[derive(Debug, Default)]
pub struct CompiledPolicy {
    /// Ordered constraint tuples; order is contractual.
    pub constraints: Vec<Constraint>,
    /// Executor option overrides (resource quotas and the like) to merge
    /// into the outgoing spec.
    pub refined_options: HashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct PolicyCompiler;

impl PolicyCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Compile placement intent against one executor's configuration.
    /// The caller has already resolved the executor; an unknown executor
    /// never reaches this point.
    pub fn compile(
        &self,
        configs: &ExecutorWholeConfigs,
        labels: &HashMap<String, String>,
        info: &ScheduleInfo,
    ) -> CompiledPolicy {
        let constraints = build_constraints(info);
        let refined_options = refine_options(configs, labels);
        debug!(
            executor = %configs.basic_config.name,
            constraints = constraints.len(),
            "compiled scheduling policy"
        );
        CompiledPolicy {
            constraints,
            refined_options,
        }
    }
}

/// Construction order reproduced exactly for behavioral parity:
/// platform (+ not-locked) short-circuits everything else; then
/// prefix-based exclusions, plain exclusions (with the implicit platform
/// and locked excludes), prefix-based inclusions, exclusive likes, plain
/// likes (OR-ed with "any" under the flag), the inclusive OR-group, and
/// finally explicit host pins.
pub fn build_constraints(info: &ScheduleInfo) -> Vec<Constraint> {
    let mut cons = Vec::new();

    if info.is_platform {
        cons.push(Constraint::like(DCOS_ATTRIBUTE, tag_word(TAG_PLATFORM)));
        if info.is_unlocked {
            cons.push(Constraint::unlike(DCOS_ATTRIBUTE, tag_word(TAG_LOCKED)));
        }
        return cons;
    }

    for unlike_prefix in &info.unlike_prefixes {
        cons.push(Constraint::unlike(DCOS_ATTRIBUTE, tag_prefix(unlike_prefix)));
    }

    let mut unlikes = info.unlikes.clone();
    // Not platform-scoped here, so keep platform nodes out; same for
    // locked nodes when the workload asked for unlocked placement.
    unlikes.push(TAG_PLATFORM.to_string());
    if info.is_unlocked {
        unlikes.push(TAG_LOCKED.to_string());
    }
    for unlike in &unlikes {
        cons.push(Constraint::unlike(DCOS_ATTRIBUTE, tag_word(unlike)));
    }

    for like_prefix in &info.like_prefixes {
        cons.push(Constraint::like(DCOS_ATTRIBUTE, tag_word(like_prefix)));
    }

    for exclusive_like in &info.exclusive_likes {
        cons.push(Constraint::like(DCOS_ATTRIBUTE, tag_word(exclusive_like)));
    }

    for like in &info.likes {
        if info.flag {
            cons.push(Constraint::like(
                DCOS_ATTRIBUTE,
                format!("{}|{}", tag_word(TAG_ANY), tag_word(like)),
            ));
        } else {
            cons.push(Constraint::like(DCOS_ATTRIBUTE, tag_word(like)));
        }
    }

    if !info.inclusive_likes.is_empty() {
        let sentence = info
            .inclusive_likes
            .iter()
            .map(|like| tag_word(like))
            .collect::<Vec<_>>()
            .join("|");
        cons.push(Constraint::like(DCOS_ATTRIBUTE, sentence));
    }

    if !info.specific_host.is_empty() {
        cons.push(Constraint::like(
            "hostname",
            info.specific_host.join("|"),
        ));
    }

    cons
}

/// Pick option overrides from the whole-config snapshot: the basic CPU
/// quota plus any org/workspace overlay matching the workload's labels.
fn refine_options(
    configs: &ExecutorWholeConfigs,
    labels: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut refined = HashMap::new();

    if let Some(quota) = configs.basic_option(OPT_CPU_NUM_QUOTA) {
        refined.insert(OPT_CPU_NUM_QUOTA.to_string(), quota.to_string());
    }

    let plus = match (&configs.plus_configs, labels.get(LABEL_ORG)) {
        (Some(plus), Some(org)) => plus.orgs.iter().find(|o| &o.name == org),
        _ => None,
    };
    if let Some(org) = plus {
        for (k, v) in &org.options {
            refined.insert(k.clone(), v.clone());
        }
        if let Some(workspace) = labels.get(LABEL_WORKSPACE) {
            if let Some(ws) = org.workspaces.iter().find(|w| &w.name == workspace) {
                for (k, v) in &ws.options {
                    refined.insert(k.clone(), v.clone());
                }
            }
        }
    }

    refined
}
