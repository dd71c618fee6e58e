use thiserror::Error;

/// Raised once, at topology validation time (construction), never during
/// `select`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvalidConfigError {
    #[error("container {container:?} has no components")]
    EmptyComponents { container: String },

    #[error("duplicate leaf name {name:?}")]
    DuplicateLeafName { name: String },

    #[error("leaf {name:?} has negative static weight {weight}")]
    NegativeWeight { name: String, weight: f64 },

    #[error("topology has no leaves reachable from the root")]
    NoReachableLeaves,
}
