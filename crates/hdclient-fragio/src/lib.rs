//! HTTP fragment I/O: the external-boundary contract the orchestrator
//! issues PUT/GET/DELETE fragment requests through.
//!
//! This crate defines the contract only — [`FragmentIo`], its
//! request/response types, and the wire-visible `Content-Type`/`Accept`
//! grammar ([`ContentSpec`]) — plus [`with_timeout`], the exactly-once
//! timeout wrapper transport implementors build on. No concrete HTTP
//! client lives here; production code supplies one, and
//! `hdclient-testkit` supplies a scripted in-memory double for tests.

mod content;
mod error;
mod fragio;

pub use content::{ContentSpec, HYPERDRIVE_APPLICATION, STORAGE_BASE_URL};
pub use error::ClassifiedError;
pub use fragio::{
    with_timeout, DeleteRequest, FragmentAddress, FragmentIo, GetRequest, GetResponse, PutRequest,
};
