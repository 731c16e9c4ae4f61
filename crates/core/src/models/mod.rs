pub mod cluster;
pub mod constraints;
pub mod executor_config;
pub mod job;
pub mod schedule_info;
pub mod service_group;
pub mod task;
pub mod volume;

pub use cluster::*;
pub use constraints::*;
pub use executor_config::*;
pub use job::*;
pub use schedule_info::*;
pub use service_group::*;
pub use task::*;
pub use volume::*;
