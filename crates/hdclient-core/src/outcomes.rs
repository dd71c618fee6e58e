use bytes::Bytes;

use crate::error::HdClientError;

/// Addressing context for a PUT, mirroring `keyContext` in §4.E.1.
#[derive(Clone, Debug)]
pub struct KeyContext {
    pub bucket_name: String,
    pub object_key: String,
    pub version: Option<String>,
}

/// The `rawKey` is returned regardless of whether the PUT ultimately
/// succeeds, so callers can garbage-collect fragments under a key they
/// never hear success for. It is `None` only when code selection itself
/// failed, before any key could be minted.
#[derive(Debug)]
pub struct PutOutcome {
    pub raw_key: Option<String>,
    pub result: Result<(), HdClientError>,
    pub failed_to_persist: bool,
}

#[derive(Debug)]
pub struct GetOutcome {
    pub body: Result<Bytes, HdClientError>,
    pub failed_to_persist: bool,
}

#[derive(Debug)]
pub struct DeleteOutcome {
    pub result: Result<(), HdClientError>,
    pub failed_to_persist: bool,
}
