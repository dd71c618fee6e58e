use thiserror::Error;

/// Failure taxonomy for [`crate::FragmentsLayout::deserialize`].
///
/// Each variant's `Display` text is wire-visible: downstream HTTP mapping
/// keys off the message family, so the exact wording is part of the
/// contract, not incidental.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeySchemeDeserializeError {
    #[error("Unknown version {0}")]
    UnknownVersion(String),

    #[error("Unknown serviceId {0}")]
    UnknownServiceId(String),

    #[error("Bad key: no split section")]
    NoSplitSection,

    #[error("Bad key: no replication policy section")]
    NoReplicationPolicySection,

    #[error("Bad key: no ctime section")]
    NoCtimeSection,

    #[error("Bad key: no rand section")]
    NoRandSection,

    #[error("Found {found} parts, expected {expected}")]
    LocationCountMismatch { found: usize, expected: String },

    #[error("Failed to deserialize split section: {0}")]
    BadSplitSection(String),
}
