use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hdclient_key::CodeKind;
use hdclient_placement::{InvalidConfigError as TopologyError, NodeSpec, Topology};

use crate::codes::{CodeRule, CodesTable};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CodeEntryKind {
    Cp,
    Rs,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CodeEntry {
    #[serde(rename = "type")]
    pub kind: CodeEntryKind,
    pub data_parts: u32,
    #[serde(default)]
    pub coding_parts: u32,
    pub pattern: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub cluster: NodeSpec,
    #[serde(default)]
    pub min_split_size: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct ErrorAgentConfig {
    #[serde(default)]
    pub kafka_brokers: String,
}

/// The raw, untrusted configuration surface (§6), as loaded from TOML.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HdClientConfig {
    pub service_id: u64,
    pub policy: PolicyConfig,
    pub codes: Vec<CodeEntry>,
    #[serde(default)]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub error_agent: ErrorAgentConfig,
}

/// Raised while validating an [`HdClientConfig`], always at construction
/// time — never once the client is serving PUT/GET/DELETE.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvalidConfigError {
    #[error("invalid config field {field}={value}: {message}")]
    Invalid {
        field: String,
        value: String,
        message: String,
    },

    #[error("invalid policy.cluster: {0}")]
    Topology(#[from] TopologyError),

    #[error("codes[{index}].pattern {pattern:?} is not a valid regex: {message}")]
    BadPattern {
        index: usize,
        pattern: String,
        message: String,
    },
}

/// The validated, immutable configuration an [`crate::HdClient`] is
/// built from. Read-only for the client's entire lifetime.
#[derive(Debug)]
pub struct ValidatedConfig {
    pub service_id: u64,
    pub topology: Topology,
    pub min_split_size: u64,
    pub codes: CodesTable,
    pub request_timeout: Duration,
    pub error_agent_kafka_brokers: String,
}

impl HdClientConfig {
    pub fn validate(self) -> Result<ValidatedConfig, InvalidConfigError> {
        let topology = Topology::build(&self.policy.cluster)?;

        let mut rules = Vec::with_capacity(self.codes.len());
        for (index, entry) in self.codes.into_iter().enumerate() {
            if entry.data_parts == 0 {
                return Err(InvalidConfigError::Invalid {
                    field: format!("codes[{index}].dataParts"),
                    value: "0".to_string(),
                    message: "dataParts must be at least 1".to_string(),
                });
            }
            let (code, coding_parts) = match entry.kind {
                CodeEntryKind::Cp => {
                    if entry.coding_parts != 0 {
                        return Err(InvalidConfigError::Invalid {
                            field: format!("codes[{index}].codingParts"),
                            value: entry.coding_parts.to_string(),
                            message: "CP requires codingParts = 0".to_string(),
                        });
                    }
                    (CodeKind::Cp, 0)
                }
                CodeEntryKind::Rs => {
                    if entry.coding_parts < 1 {
                        return Err(InvalidConfigError::Invalid {
                            field: format!("codes[{index}].codingParts"),
                            value: entry.coding_parts.to_string(),
                            message: "RS requires codingParts >= 1".to_string(),
                        });
                    }
                    (CodeKind::Rs, entry.coding_parts)
                }
            };
            let regex = Regex::new(&entry.pattern).map_err(|e| InvalidConfigError::BadPattern {
                index,
                pattern: entry.pattern.clone(),
                message: e.to_string(),
            })?;
            rules.push(CodeRule::new(entry.pattern, regex, code, entry.data_parts, coding_parts));
        }

        Ok(ValidatedConfig {
            service_id: self.service_id,
            topology,
            min_split_size: self.policy.min_split_size,
            codes: CodesTable::new(rules),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            error_agent_kafka_brokers: self.error_agent.kafka_brokers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdclient_placement::{Affinity, Ftype};

    fn minimal_cluster() -> NodeSpec {
        NodeSpec::Leaf {
            name: "only".to_string(),
            static_weight: 1.0,
            ftype: Ftype::Both,
            affinity: Affinity::Soft,
        }
    }

    #[test]
    fn rejects_rs_with_zero_coding_parts() {
        let config = HdClientConfig {
            service_id: 1,
            policy: PolicyConfig {
                cluster: minimal_cluster(),
                min_split_size: 0,
            },
            codes: vec![CodeEntry {
                kind: CodeEntryKind::Rs,
                data_parts: 2,
                coding_parts: 0,
                pattern: ".*".to_string(),
            }],
            request_timeout_ms: 0,
            error_agent: ErrorAgentConfig::default(),
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, InvalidConfigError::Invalid { .. }));
    }

    #[test]
    fn rejects_cp_with_nonzero_coding_parts() {
        let config = HdClientConfig {
            service_id: 1,
            policy: PolicyConfig {
                cluster: minimal_cluster(),
                min_split_size: 0,
            },
            codes: vec![CodeEntry {
                kind: CodeEntryKind::Cp,
                data_parts: 1,
                coding_parts: 1,
                pattern: ".*".to_string(),
            }],
            request_timeout_ms: 0,
            error_agent: ErrorAgentConfig::default(),
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, InvalidConfigError::Invalid { .. }));
    }

    #[test]
    fn rejects_bad_regex_pattern() {
        let config = HdClientConfig {
            service_id: 1,
            policy: PolicyConfig {
                cluster: minimal_cluster(),
                min_split_size: 0,
            },
            codes: vec![CodeEntry {
                kind: CodeEntryKind::Cp,
                data_parts: 1,
                coding_parts: 0,
                pattern: "(unclosed".to_string(),
            }],
            request_timeout_ms: 0,
            error_agent: ErrorAgentConfig::default(),
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, InvalidConfigError::BadPattern { .. }));
    }

    #[test]
    fn accepts_valid_config() {
        let config = HdClientConfig {
            service_id: 1,
            policy: PolicyConfig {
                cluster: minimal_cluster(),
                min_split_size: 0,
            },
            codes: vec![CodeEntry {
                kind: CodeEntryKind::Rs,
                data_parts: 2,
                coding_parts: 1,
                pattern: "^bucket/".to_string(),
            }],
            request_timeout_ms: 5_000,
            error_agent: ErrorAgentConfig {
                kafka_brokers: "broker-a:9092,broker-b:9092".to_string(),
            },
        };
        let validated = config.validate().unwrap();
        assert_eq!(validated.request_timeout, Duration::from_millis(5_000));
        let rule = validated.codes.match_for("bucket", "x").unwrap();
        assert_eq!(rule.code, CodeKind::Rs);
    }
}
