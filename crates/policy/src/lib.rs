//! Scheduling-policy / constraint compiler.
//!
//! Turns a workload's abstract placement intent (`ScheduleInfo`) into an
//! ordered list of generic `(attribute, operator, value)` constraint
//! tuples, plus backend-native renderings of those tuples and an
//! optional refined-configuration override taken from the executor's
//! whole-config snapshot. The tuple construction order is part of the
//! compiler's contract: backends and tests depend on it.

pub mod compiler;
pub mod constraints;
pub mod render;


pub use compiler::{CompiledPolicy, PolicyCompiler};
pub use constraints::{Constraint, ConstraintOp};
