use thiserror::Error;

/// Errors raised while framing, encoding, or decoding chunk payloads.
/// Distinct from transport-layer errors (see `hdclient-fragio`), which
/// wrap these when a GET fragment fails its integrity check.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    #[error(
        "corrupted fragment data: chunk {chunk_id} fragment {fragment_id} expected crc {expected_crc:#010x}, got {actual_crc:#010x}"
    )]
    CorruptedData {
        chunk_id: u64,
        fragment_id: u32,
        expected_crc: u32,
        actual_crc: u32,
    },

    #[error("fragment payload too short to contain a crc footer: {len} bytes")]
    TruncatedFrame { len: usize },

    #[error("erasure coder rejected shard layout: {0}")]
    ShardLayout(String),

    #[error("not enough shards to reconstruct: need {k}, have {available}")]
    InsufficientShards { k: u32, available: u32 },
}
