use std::fmt;

use serde::{Deserialize, Serialize};

/// Generic placement rule understood by every backend: `attribute op
/// value`, where the value is a regex matched against the node
/// attribute's comma-joined tag string. Produced by the policy compiler,
/// rendered into backend-native form by the adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintOp {
    Like,
    Unlike,
}

impl fmt::Display for ConstraintOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintOp::Like => write!(f, "LIKE"),
            ConstraintOp::Unlike => write!(f, "UNLIKE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub attribute: String,
    pub op: ConstraintOp,
    pub value: String,
}

impl Constraint {
    pub fn like(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            op: ConstraintOp::Like,
            value: value.into(),
        }
    }

    pub fn unlike(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            op: ConstraintOp::Unlike,
            value: value.into(),
        }
    }
}
