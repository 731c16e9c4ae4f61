//! Task dispatch: executor registry, per-executor worker pools, and the
//! `Sched` front door that lifecycle services submit tasks through.

pub mod plugins;
pub mod pool;
pub mod registry;
pub mod sched;
pub mod task;

#[cfg(test)]
mod sched_test;

pub use pool::WorkerPool;
pub use registry::{EventCallback, ExecutorFactory, ExecutorRegistry};
pub use sched::Sched;
pub use task::{Task, TaskSender};
