//! Shared test fixtures: workload builders and mock collaborators.

pub mod builders;
pub mod mocks;

pub use builders::{JobBuilder, ServiceGroupBuilder};
pub use mocks::MockExecutor;
