use hdclient_core::{CodeEntry, CodeEntryKind, ErrorAgentConfig, HdClientConfig, PolicyConfig};
use hdclient_placement::{Affinity, Ftype, NodeSpec};

/// A single `Both`/`Soft` leaf, usable wherever a one-node cluster is
/// enough (§8 scenario S1).
pub fn single_leaf(name: &str) -> NodeSpec {
    NodeSpec::Leaf {
        name: name.to_string(),
        static_weight: 1.0,
        ftype: Ftype::Both,
        affinity: Affinity::Soft,
    }
}

/// A flat, soft-affinity container of equally-weighted `Both` leaves.
pub fn flat_cluster(names: &[&str]) -> NodeSpec {
    NodeSpec::Container {
        name: None,
        ftype: None,
        affinity: None,
        components: names.iter().map(|n| single_leaf(n)).collect(),
    }
}

pub fn cp_code(pattern: &str, data_parts: u32) -> CodeEntry {
    CodeEntry {
        kind: CodeEntryKind::Cp,
        data_parts,
        coding_parts: 0,
        pattern: pattern.to_string(),
    }
}

pub fn rs_code(pattern: &str, data_parts: u32, coding_parts: u32) -> CodeEntry {
    CodeEntry {
        kind: CodeEntryKind::Rs,
        data_parts,
        coding_parts,
        pattern: pattern.to_string(),
    }
}

pub fn config(service_id: u64, cluster: NodeSpec, min_split_size: u64, codes: Vec<CodeEntry>) -> HdClientConfig {
    HdClientConfig {
        service_id,
        policy: PolicyConfig {
            cluster,
            min_split_size,
        },
        codes,
        request_timeout_ms: 0,
        error_agent: ErrorAgentConfig::default(),
    }
}
