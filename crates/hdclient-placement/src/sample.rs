use rand::{Rng, RngCore};

use crate::tree::{Affinity, Ftype, Topology};

/// Draws a weighted categorical index: `u ~ U(0, sum)`, returns the first
/// index whose cumulative weight exceeds `u`.
///
/// `sum`, if given, is trusted as the true total; passing one smaller
/// than `weights.iter().sum()` skews the draw towards the front (a
/// documented footgun, not guarded against here — callers must pass the
/// correct sum).
pub fn weighted_categorical(weights: &[f64], sum: Option<f64>, rng: &mut dyn RngCore) -> Option<usize> {
    let total = sum.unwrap_or_else(|| weights.iter().sum());
    if total <= 0.0 {
        return None;
    }
    let u: f64 = rng.gen_range(0.0..total);
    let mut cumulative = 0.0;
    for (idx, &w) in weights.iter().enumerate() {
        if w <= 0.0 {
            continue;
        }
        cumulative += w;
        if cumulative > u {
            return Some(idx);
        }
    }
    // Floating point rounding can leave `u` a hair under `total` without
    // tripping the `>` above; fall back to the last positive weight.
    weights.iter().rposition(|&w| w > 0.0)
}

/// Per-`select` call mutable overlay: a scratch copy of every node's
/// `dynamic_weights`, zeroed as slots get consumed by hard affinity or
/// ruled out as unplaceable. Never touches the immutable `Topology`.
struct Scratch {
    weights: Vec<Vec<f64>>,
}

impl Scratch {
    fn new(topology: &Topology) -> Self {
        let weights = (0..topology_len(topology))
            .map(|idx| topology.dynamic_weights(idx).to_vec())
            .collect();
        Scratch { weights }
    }
}

fn topology_len(topology: &Topology) -> usize {
    topology.len()
}

/// Result of a single `select` call: one slot per requested data/coding
/// fragment, `None` where the topology could not place it.
#[derive(Clone, Debug, Default)]
pub struct PlacementResult {
    pub data: Vec<Option<String>>,
    pub coding: Vec<Option<String>>,
}

/// Samples `k` data and `m` coding fragment destinations from `topology`.
/// Deterministic for a fixed `rng` seed and topology.
pub fn select(topology: &Topology, k: u32, m: u32, rng: &mut dyn RngCore) -> PlacementResult {
    let mut scratch = Scratch::new(topology);
    let mut result = PlacementResult {
        data: Vec::with_capacity(k as usize),
        coding: Vec::with_capacity(m as usize),
    };
    for _ in 0..k {
        result.data.push(sample_one(topology, topology.root(), Ftype::Data, &mut scratch, rng));
    }
    for _ in 0..m {
        result
            .coding
            .push(sample_one(topology, topology.root(), Ftype::Coding, &mut scratch, rng));
    }
    result
}

/// Recursively samples one leaf of type `want` under `node_idx`,
/// consulting/mutating `scratch` as subtrees are exhausted or consumed
/// under hard affinity. Returns `None` ("unplaceable here") rather than
/// the source's sentinel `-1`.
fn sample_one(
    topology: &Topology,
    node_idx: usize,
    want: Ftype,
    scratch: &mut Scratch,
    rng: &mut dyn RngCore,
) -> Option<String> {
    let view = topology.node(node_idx);
    if view.is_leaf() {
        return if view.compatible(want) {
            view.leaf_name().map(str::to_string)
        } else {
            None
        };
    }

    let children = topology.children(node_idx);
    loop {
        let weights = &scratch.weights[node_idx];
        let candidate_positions: Vec<usize> = children
            .iter()
            .enumerate()
            .filter(|&(ci, &child_idx)| weights[ci] > 0.0 && topology.node(child_idx).compatible(want))
            .map(|(ci, _)| ci)
            .collect();
        if candidate_positions.is_empty() {
            return None;
        }
        let candidate_weights: Vec<f64> = candidate_positions.iter().map(|&ci| weights[ci]).collect();
        let Some(local) = weighted_categorical(&candidate_weights, None, rng) else {
            return None;
        };
        let chosen_ci = candidate_positions[local];
        let child_idx = children[chosen_ci];

        match sample_one(topology, child_idx, want, scratch, rng) {
            Some(uuid) => {
                if topology.node(child_idx).affinity() == Affinity::Hard {
                    scratch.weights[node_idx][chosen_ci] = 0.0;
                }
                return Some(uuid);
            }
            None => {
                scratch.weights[node_idx][chosen_ci] = 0.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeSpec;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn leaf(name: &str, weight: f64, ftype: Ftype, affinity: Affinity) -> NodeSpec {
        NodeSpec::Leaf {
            name: name.to_string(),
            static_weight: weight,
            ftype,
            affinity,
        }
    }

    #[test]
    fn weighted_categorical_all_zero_returns_none() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(weighted_categorical(&[0.0, 0.0, 0.0], None, &mut rng), None);
    }

    #[test]
    fn weighted_categorical_single_positive_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            assert_eq!(
                weighted_categorical(&[0.0, 5.0, 0.0], None, &mut rng),
                Some(1)
            );
        }
    }

    #[test]
    fn single_leaf_s1_scenario() {
        let spec = leaf("only", 1.0, Ftype::Both, Affinity::Soft);
        let topo = Topology::build(&spec).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let result = select(&topo, 1, 0, &mut rng);
        assert_eq!(result.data, vec![Some("only".to_string())]);
        assert!(result.coding.is_empty());
    }

    #[test]
    fn hard_affinity_never_places_two_fragments_in_same_subtree() {
        let spec = NodeSpec::Container {
            name: Some("rack".into()),
            ftype: None,
            affinity: Some(Affinity::Hard),
            components: vec![
                leaf("a", 1.0, Ftype::Both, Affinity::Soft),
                leaf("b", 1.0, Ftype::Both, Affinity::Soft),
            ],
        };
        let root = NodeSpec::Container {
            name: None,
            ftype: None,
            affinity: None,
            components: vec![spec],
        };
        let topo = Topology::build(&root).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let result = select(&topo, 2, 0, &mut rng);
        // Only one of the two rack leaves can be chosen; the second data
        // slot has nowhere left to go once the rack is exhausted.
        assert!(result.data[0].is_some());
        assert!(result.data[1].is_none());
    }

    #[test]
    fn soft_affinity_allows_subtree_reuse() {
        let spec = NodeSpec::Container {
            name: Some("rack".into()),
            ftype: None,
            affinity: Some(Affinity::Soft),
            components: vec![leaf("a", 1.0, Ftype::Both, Affinity::Soft)],
        };
        let topo = Topology::build(&spec).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let result = select(&topo, 3, 0, &mut rng);
        assert_eq!(
            result.data,
            vec![
                Some("a".to_string()),
                Some("a".to_string()),
                Some("a".to_string())
            ]
        );
    }

    #[test]
    fn ftype_coding_never_lands_in_data_only_subtree() {
        let spec = NodeSpec::Container {
            name: None,
            ftype: None,
            affinity: None,
            components: vec![
                leaf("data-only", 1.0, Ftype::Data, Affinity::Soft),
                leaf("coding-only", 1.0, Ftype::Coding, Affinity::Soft),
            ],
        };
        let topo = Topology::build(&spec).unwrap();
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..50 {
            let result = select(&topo, 1, 1, &mut rng);
            assert_eq!(result.data, vec![Some("data-only".to_string())]);
            assert_eq!(result.coding, vec![Some("coding-only".to_string())]);
        }
    }

    #[test]
    fn deterministic_for_fixed_seed() {
        let spec = NodeSpec::Container {
            name: None,
            ftype: None,
            affinity: None,
            components: vec![
                leaf("a", 1.0, Ftype::Both, Affinity::Soft),
                leaf("b", 2.0, Ftype::Both, Affinity::Soft),
                leaf("c", 3.0, Ftype::Both, Affinity::Soft),
            ],
        };
        let topo = Topology::build(&spec).unwrap();
        let draw = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            select(&topo, 2, 1, &mut rng).data
        };
        assert_eq!(draw(123), draw(123));
    }
}
