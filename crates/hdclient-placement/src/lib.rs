//! Weighted placement over a nested topology.
//!
//! A [`Topology`] is an immutable arena built once from a [`NodeSpec`]
//! tree and validated at construction. Each [`select`] call draws `k`
//! data and `m` coding fragment destinations against a scratch overlay,
//! honoring per-node `ftype` (data/coding/both) and `affinity`
//! (hard/soft subtree reuse) constraints; the topology itself is never
//! mutated, so it can be shared across concurrent calls.

mod error;
mod sample;
mod tree;

pub use error::InvalidConfigError;
pub use sample::{select, weighted_categorical, PlacementResult};
pub use tree::{Affinity, Ftype, NodeSpec, Topology};
