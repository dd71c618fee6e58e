//! Orchestrator: PUT/GET/DELETE state machines over the split/codec
//! pipeline, fragment I/O, and placement, plus the configuration and
//! error-agent surfaces that tie them together.
//!
//! [`HdClient`] is the facade applications hold; everything else here
//! (codes table, `OpCtx`, the per-operation state machines under
//! [`orchestrator`]) exists to implement its three methods.

mod client;
mod codes;
mod config;
mod error;
mod intent;
mod opctx;
mod orchestrator;
mod outcomes;

pub use client::HdClient;
pub use codes::{CodeRule, CodesTable};
pub use config::{
    CodeEntry, CodeEntryKind, ErrorAgentConfig, HdClientConfig, InvalidConfigError, PolicyConfig, ValidatedConfig,
};
pub use error::{worst_classified, HdClientError};
pub use intent::{ErrorAgent, FragmentRef, IntentRecord, IntentTopic};
pub use opctx::{ChunkStatus, FragmentStatus, OpCtx};
pub use orchestrator::{body_from_bytes, PutBody};
pub use outcomes::{DeleteOutcome, GetOutcome, KeyContext, PutOutcome};
