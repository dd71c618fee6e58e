//! In-memory test doubles and config builders for exercising
//! [`hdclient_core::HdClient`] without a real fragment transport or
//! error-agent sink.

mod builders;
mod error_agent;
mod fragio;

pub use builders::{config, cp_code, flat_cluster, rs_code, single_leaf};
pub use error_agent::RecordingErrorAgent;
pub use fragio::ScriptedFragmentIo;
