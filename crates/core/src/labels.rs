//! Tag and option-key constants shared between the policy compiler, the
//! lifecycle services and cluster provisioning.

/// The node attribute that carries the comma-joined tag set on dcos-like
/// backends. Constraint tuples match against this attribute.
pub const DCOS_ATTRIBUTE: &str = "dice_tags";

pub const TAG_ANY: &str = "any";
pub const TAG_LOCKED: &str = "locked";
pub const TAG_PLATFORM: &str = "platform";
pub const TAG_SERVICE_STATELESS: &str = "service-stateless";
pub const TAG_SERVICE_STATEFUL: &str = "service-stateful";
pub const TAG_JOB: &str = "job";

/// Workload labels the lifecycle services append before dispatch.
pub const LABEL_MATCH_TAGS: &str = "MATCH_TAGS";
pub const LABEL_EXCLUDE_TAGS: &str = "EXCLUDE_TAGS";
pub const LABEL_SERVICE_TYPE: &str = "SERVICE_TYPE";

pub const LAST_RESTART_TIME_KEY: &str = "lastRestartTime";
pub const LAST_CONFIG_UPDATE_TIME_KEY: &str = "lastConfigUpdateTime";

/// Executor option keys written by cluster provisioning.
pub const OPT_ADDR: &str = "ADDR";
pub const OPT_ENABLE_TAG: &str = "ENABLETAG";
pub const OPT_ENABLE_ORG: &str = "ENABLE_ORG";
pub const OPT_ENABLE_WORKSPACE: &str = "ENABLE_WORKSPACE";
pub const OPT_CPU_NUM_QUOTA: &str = "CPU_NUM_QUOTA";
pub const OPT_BASIC_AUTH: &str = "BASICAUTH";
pub const OPT_CA_CRT: &str = "CA_CRT";
pub const OPT_CLIENT_CRT: &str = "CLIENT_CRT";
pub const OPT_CLIENT_KEY: &str = "CLIENT_KEY";
pub const OPT_IS_EDAS: &str = "IS_EDAS";
