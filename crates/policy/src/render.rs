//! Backend-native renderings of the generic constraint tuples.

use serde::{Deserialize, Serialize};

use dicesched_core::models::ScheduleInfo;

use crate::constraints::Constraint;

/// dcos-style constraint triples, `["attribute", "OP", "value"]`, as the
/// marathon/metronome wire format expects them.
pub fn dcos_triples(constraints: &[Constraint]) -> Vec<[String; 3]> {
    constraints
        .iter()
        .map(|c| [c.attribute.clone(), c.op.to_string(), c.value.clone()])
        .collect()
}

const K8S_LABEL_PREFIX: &str = "dice/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeSelectorOperator {
    Exists,
    DoesNotExist,
    In,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSelectorRequirement {
    pub key: String,
    pub operator: NodeSelectorOperator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSelectorTerm {
    #[serde(default)]
    pub match_expressions: Vec<NodeSelectorRequirement>,
    #[serde(default)]
    pub match_fields: Vec<NodeSelectorRequirement>,
}

/// Kubernetes-flavored affinity: one required node-selector term built
/// from label existence checks. A specific host pin overrides everything
/// else with a `metadata.name` field match, which is how k8s wants
/// single-node targeting expressed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeAffinity {
    pub required_terms: Vec<NodeSelectorTerm>,
}

pub fn k8s_affinity(info: &ScheduleInfo) -> NodeAffinity {
    if let Some(host) = info.specific_host.first() {
        return NodeAffinity {
            required_terms: vec![NodeSelectorTerm {
                match_expressions: Vec::new(),
                match_fields: vec![NodeSelectorRequirement {
                    key: "metadata.name".to_string(),
                    operator: NodeSelectorOperator::In,
                    values: vec![host.clone()],
                }],
            }],
        };
    }

    let mut expressions = Vec::new();
    expressions.push(exists(dicesched_core::labels::TAG_LOCKED, !info.is_unlocked));
    if info.is_platform {
        expressions.push(exists(dicesched_core::labels::TAG_PLATFORM, true));
    } else {
        expressions.push(exists(dicesched_core::labels::TAG_PLATFORM, false));
        for like in info.likes.iter().chain(&info.exclusive_likes) {
            expressions.push(exists(like, true));
        }
        for unlike in &info.unlikes {
            expressions.push(exists(unlike, false));
        }
    }

    NodeAffinity {
        required_terms: vec![NodeSelectorTerm {
            match_expressions: expressions,
            match_fields: Vec::new(),
        }],
    }
}

fn exists(label: &str, present: bool) -> NodeSelectorRequirement {
    NodeSelectorRequirement {
        key: format!("{K8S_LABEL_PREFIX}{label}"),
        operator: if present {
            NodeSelectorOperator::Exists
        } else {
            NodeSelectorOperator::DoesNotExist
        },
        values: Vec::new(),
    }
}
