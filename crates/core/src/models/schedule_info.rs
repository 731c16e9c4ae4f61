use serde::{Deserialize, Serialize};

use crate::models::constraints::Constraint;

/// Abstract placement intent attached to a workload before constraint
/// compilation. Tag lists reference entries of the node's comma-joined
/// tag attribute; the compiler turns them into backend constraints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleInfo {
    /// Schedule onto nodes carrying one of these tags.
    pub likes: Vec<String>,
    /// Never schedule onto nodes carrying one of these tags.
    pub unlikes: Vec<String>,

    /// Prefix-based variants of the above, matching whole tag families.
    pub like_prefixes: Vec<String>,
    pub unlike_prefixes: Vec<String>,

    /// Likes that never coexist with the universal "any" tag.
    pub exclusive_likes: Vec<String>,
    /// An OR-group of likes folded into a single constraint.
    pub inclusive_likes: Vec<String>,

    /// When set, plain likes are OR-ed with the "any" tag.
    pub flag: bool,

    /// Pin to specific hosts; entries are OR-ed.
    pub specific_host: Vec<String>,

    /// Schedule onto platform-reserved nodes.
    pub is_platform: bool,
    /// Keep off locked (cordoned) nodes. Always true in practice.
    pub is_unlocked: bool,

    /// Spread services of one group across hosts.
    pub host_unique: bool,
    pub host_unique_info: Vec<Vec<String>>,

    /// Filled in by the policy compiler right before dispatch; adapters
    /// render these into their native placement form.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
}
