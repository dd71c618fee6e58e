use async_trait::async_trait;
use serde::Serialize;

/// One fragment addressed within an intent record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FragmentRef {
    pub chunk: u64,
    pub fragment: u32,
}

/// A recorded request for the out-of-scope janitor to act on: clean up
/// fragments whose post-condition is unknown (`Delete`), reconstruct
/// missing/corrupted ones (`Repair`), or merely verify placement
/// (`Check`, not emitted by the orchestrator itself but part of the
/// agent's topic surface).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntentTopic {
    Delete,
    Repair,
    Check,
}

impl IntentTopic {
    pub fn as_str(self) -> &'static str {
        match self {
            IntentTopic::Delete => "delete",
            IntentTopic::Repair => "repair",
            IntentTopic::Check => "check",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct IntentRecord {
    pub raw_key: String,
    pub fragments: Vec<FragmentRef>,
    pub version: Option<String>,
}

/// The core's sole out-of-process collaborator: an opaque sink for
/// delete/repair/check intents. The core assumes nothing about
/// ordering, deduplication, or retry on the other side — only whether
/// `send` itself succeeded.
#[async_trait]
pub trait ErrorAgent: Send + Sync {
    async fn send(&self, topic: IntentTopic, records: Vec<IntentRecord>) -> Result<(), String>;
}
