//! Core abstractions shared by every crate in the workspace: the error
//! taxonomy, the persisted data model, and the trait seams (`Executor`,
//! `KvStore`, `VolumeDriver`) that the dispatcher and lifecycle services
//! are wired against.

pub mod errors;
pub mod labels;
pub mod models;
pub mod traits;

pub use errors::{SchedulerError, SchedulerResult};
