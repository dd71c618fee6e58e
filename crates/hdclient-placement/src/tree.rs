use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::InvalidConfigError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ftype {
    Data,
    Coding,
    Both,
}

impl Ftype {
    fn compatible(self, want: Ftype) -> bool {
        self == want || self == Ftype::Both
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Affinity {
    Hard,
    Soft,
}

/// User-facing, recursive description of a topology: the configuration
/// surface in spec §6 before it is flattened into an arena.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeSpec {
    Leaf {
        name: String,
        static_weight: f64,
        ftype: Ftype,
        affinity: Affinity,
    },
    Container {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        ftype: Option<Ftype>,
        #[serde(default)]
        affinity: Option<Affinity>,
        components: Vec<NodeSpec>,
    },
}

#[derive(Debug)]
enum NodeKind {
    Leaf { name: String },
    Container { children: Vec<usize> },
}

/// One flattened arena slot. `dynamic_weights[i]` is the total static
/// weight reachable through `children[i]`'s subtree; `dynamic_sum` is
/// their sum. `effective_ftype` already has container-level overrides
/// folded in top-down, so compatibility checks never need to re-walk a
/// subtree.
#[derive(Debug)]
struct Node {
    kind: NodeKind,
    effective_ftype: Ftype,
    effective_affinity: Affinity,
    dynamic_weights: Vec<f64>,
    dynamic_sum: f64,
}

/// An immutable, validated topology. Cheap to share (`Arc`-wrap at the
/// call site) across concurrent `select` calls: nothing here is mutated
/// by sampling, which instead operates over a scratch overlay built
/// fresh per call (see [`crate::sample`]).
#[derive(Debug)]
pub struct Topology {
    arena: Vec<Node>,
    root: usize,
}

impl Topology {
    pub fn build(spec: &NodeSpec) -> Result<Topology, InvalidConfigError> {
        let mut arena = Vec::new();
        let mut seen_names = HashSet::new();
        build_node(spec, Ftype::Both, &mut arena, &mut seen_names)?;
        let root = arena.len() - 1;
        let topology = Topology { arena, root };
        if topology.arena[root].dynamic_sum <= 0.0 {
            return Err(InvalidConfigError::NoReachableLeaves);
        }
        Ok(topology)
    }

    pub(crate) fn root(&self) -> usize {
        self.root
    }

    pub(crate) fn node(&self, idx: usize) -> NodeView<'_> {
        NodeView {
            node: &self.arena[idx],
        }
    }

    pub(crate) fn children(&self, idx: usize) -> &[usize] {
        match &self.arena[idx].kind {
            NodeKind::Container { children } => children,
            NodeKind::Leaf { .. } => &[],
        }
    }

    pub(crate) fn dynamic_weights(&self, idx: usize) -> &[f64] {
        &self.arena[idx].dynamic_weights
    }

    pub(crate) fn len(&self) -> usize {
        self.arena.len()
    }
}

pub(crate) struct NodeView<'a> {
    node: &'a Node,
}

impl<'a> NodeView<'a> {
    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self.node.kind, NodeKind::Leaf { .. })
    }

    pub(crate) fn leaf_name(&self) -> Option<&str> {
        match &self.node.kind {
            NodeKind::Leaf { name } => Some(name),
            NodeKind::Container { .. } => None,
        }
    }

    pub(crate) fn compatible(&self, want: Ftype) -> bool {
        self.node.effective_ftype.compatible(want)
    }

    pub(crate) fn affinity(&self) -> Affinity {
        self.node.effective_affinity
    }
}

/// Recursively flattens `spec` into `arena`, resolving the effective
/// ftype top-down (a container's own `ftype`, if set, overrides what its
/// children inherit; unset containers/leaves inherit the parent's).
/// Returns the index of the node just pushed.
fn build_node(
    spec: &NodeSpec,
    inherited_ftype: Ftype,
    arena: &mut Vec<Node>,
    seen_names: &mut HashSet<String>,
) -> Result<usize, InvalidConfigError> {
    match spec {
        NodeSpec::Leaf {
            name,
            static_weight,
            ftype,
            affinity,
        } => {
            if *static_weight < 0.0 {
                return Err(InvalidConfigError::NegativeWeight {
                    name: name.clone(),
                    weight: *static_weight,
                });
            }
            if !seen_names.insert(name.clone()) {
                return Err(InvalidConfigError::DuplicateLeafName { name: name.clone() });
            }
            arena.push(Node {
                kind: NodeKind::Leaf { name: name.clone() },
                effective_ftype: *ftype,
                effective_affinity: *affinity,
                dynamic_weights: Vec::new(),
                dynamic_sum: *static_weight,
            });
            Ok(arena.len() - 1)
        }
        NodeSpec::Container {
            name,
            ftype,
            affinity,
            components,
        } => {
            if components.is_empty() {
                return Err(InvalidConfigError::EmptyComponents {
                    container: name.clone().unwrap_or_default(),
                });
            }
            let effective_ftype = ftype.unwrap_or(inherited_ftype);
            let mut children = Vec::with_capacity(components.len());
            let mut dynamic_weights = Vec::with_capacity(components.len());
            for child_spec in components {
                let child_idx = build_node(child_spec, effective_ftype, arena, seen_names)?;
                dynamic_weights.push(arena[child_idx].dynamic_sum);
                children.push(child_idx);
            }
            let dynamic_sum = dynamic_weights.iter().sum();
            arena.push(Node {
                kind: NodeKind::Container { children },
                effective_ftype,
                effective_affinity: affinity.unwrap_or(Affinity::Soft),
                dynamic_weights,
                dynamic_sum,
            });
            Ok(arena.len() - 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str, weight: f64, ftype: Ftype, affinity: Affinity) -> NodeSpec {
        NodeSpec::Leaf {
            name: name.to_string(),
            static_weight: weight,
            ftype,
            affinity,
        }
    }

    #[test]
    fn rejects_empty_container() {
        let spec = NodeSpec::Container {
            name: Some("root".into()),
            ftype: None,
            affinity: None,
            components: vec![],
        };
        assert!(matches!(
            Topology::build(&spec),
            Err(InvalidConfigError::EmptyComponents { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_leaf_names() {
        let spec = NodeSpec::Container {
            name: None,
            ftype: None,
            affinity: None,
            components: vec![
                leaf("a", 1.0, Ftype::Both, Affinity::Soft),
                leaf("a", 1.0, Ftype::Both, Affinity::Soft),
            ],
        };
        assert!(matches!(
            Topology::build(&spec),
            Err(InvalidConfigError::DuplicateLeafName { .. })
        ));
    }

    #[test]
    fn container_ftype_override_is_visible_on_the_container_itself() {
        // A container's own override gates traversal into its subtree; a
        // leaf's own declared ftype is never rewritten by an ancestor,
        // so a leaf whose type conflicts with an overriding container
        // becomes unreachable rather than silently relabeled.
        let spec = NodeSpec::Container {
            name: None,
            ftype: Some(Ftype::Coding),
            affinity: None,
            components: vec![leaf("a", 1.0, Ftype::Data, Affinity::Soft)],
        };
        let topo = Topology::build(&spec).unwrap();
        assert!(topo.node(topo.root()).compatible(Ftype::Coding));
        let leaf_idx = topo.children(topo.root())[0];
        assert!(!topo.node(leaf_idx).compatible(Ftype::Coding));
        assert!(topo.node(leaf_idx).compatible(Ftype::Data));
    }

    #[test]
    fn container_without_own_ftype_inherits_from_parent() {
        let spec = NodeSpec::Container {
            name: None,
            ftype: Some(Ftype::Data),
            affinity: None,
            components: vec![NodeSpec::Container {
                name: None,
                ftype: None,
                affinity: None,
                components: vec![leaf("a", 1.0, Ftype::Data, Affinity::Soft)],
            }],
        };
        let topo = Topology::build(&spec).unwrap();
        let inner_idx = topo.children(topo.root())[0];
        assert!(topo.node(inner_idx).compatible(Ftype::Data));
        assert!(!topo.node(inner_idx).compatible(Ftype::Coding));
    }
}
