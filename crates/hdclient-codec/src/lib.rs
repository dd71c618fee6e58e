//! Chunk-level split/codec pipeline.
//!
//! A chunk's raw bytes become `k+m` CRC32C-framed fragment payloads
//! (`encode_chunk`) and back (`decode_chunk`). `CpCodec` is full-copy
//! replication; `RsCodec` wraps `reed_solomon_erasure`'s GF(2^8)
//! implementation. Chunk/stripe geometry itself lives in `hdclient-key`,
//! since a fresh `FragmentsLayout` needs it before any bytes are coded;
//! [`range`] builds on that geometry to push byte-range GETs down to the
//! chunks they actually touch.

mod codec;
mod crc;
mod error;
pub mod range;

pub use codec::{codec_for, CpCodec, Codec, RsCodec};
pub use crc::{frame, verify};
pub use error::CodecError;
