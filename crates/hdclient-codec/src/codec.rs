use bytes::Bytes;
use reed_solomon_erasure::galois_8::ReedSolomon;

use hdclient_key::CodeKind;

use crate::crc::frame;
use crate::error::CodecError;

/// Splits a chunk's raw bytes into `k+m` CRC-framed fragment payloads,
/// and reassembles a chunk's raw bytes from whichever already-verified
/// shards survived. CRC verification is the caller's job (each fragment
/// is checked as it streams off the wire, and bad ones are classified
/// before the codec ever sees them) — `decode_chunk` trusts every `Some`
/// slot it receives. Implementations are stateless with respect to any
/// one chunk: `stripe_size`/`chunk_len` are passed per call rather than
/// carried on the codec, since they vary chunk to chunk while `k`/`m`
/// are fixed for the whole object.
pub trait Codec: Send + Sync {
    fn code(&self) -> CodeKind;

    /// Encodes `data` (exactly `chunk_len` bytes) into `k` data fragments
    /// followed by `m` coding fragments, each already CRC-framed.
    fn encode_chunk(
        &self,
        chunk_id: u64,
        data: &[u8],
        stripe_size: u64,
    ) -> Result<Vec<Bytes>, CodecError>;

    /// Reassembles a chunk from `shards` (`k+m` slots, data followed by
    /// coding, already CRC-verified and unframed; `None` where a
    /// fragment wasn't fetched or failed verification), truncated to
    /// `chunk_len` bytes.
    fn decode_chunk(
        &self,
        shards: &[Option<Bytes>],
        chunk_len: u64,
        stripe_size: u64,
    ) -> Result<Bytes, CodecError>;
}

/// Full-copy replication: every data fragment is a complete, unsharded
/// copy of the chunk. There are no coding fragments; `m` is always 0 for
/// this code.
pub struct CpCodec {
    pub k: u32,
}

impl Codec for CpCodec {
    fn code(&self) -> CodeKind {
        CodeKind::Cp
    }

    fn encode_chunk(
        &self,
        _chunk_id: u64,
        data: &[u8],
        _stripe_size: u64,
    ) -> Result<Vec<Bytes>, CodecError> {
        let framed = frame(data);
        Ok((0..self.k).map(|_| framed.clone()).collect())
    }

    fn decode_chunk(
        &self,
        shards: &[Option<Bytes>],
        chunk_len: u64,
        _stripe_size: u64,
    ) -> Result<Bytes, CodecError> {
        for slot in shards {
            let Some(payload) = slot else { continue };
            let mut payload = payload.clone();
            payload.truncate(chunk_len as usize);
            return Ok(payload);
        }
        Err(CodecError::InsufficientShards {
            k: 1,
            available: 0,
        })
    }
}

/// Reed-Solomon erasure coding over `k` data and `m` coding shards per
/// chunk, backed by `reed_solomon_erasure`'s GF(2^8) implementation.
pub struct RsCodec {
    k: u32,
    m: u32,
    rs: ReedSolomon,
}

impl RsCodec {
    pub fn new(k: u32, m: u32) -> Result<Self, CodecError> {
        let rs = ReedSolomon::new(k as usize, m as usize)
            .map_err(|e| CodecError::ShardLayout(e.to_string()))?;
        Ok(RsCodec { k, m, rs })
    }
}

impl Codec for RsCodec {
    fn code(&self) -> CodeKind {
        CodeKind::Rs
    }

    fn encode_chunk(
        &self,
        _chunk_id: u64,
        data: &[u8],
        stripe_size: u64,
    ) -> Result<Vec<Bytes>, CodecError> {
        let stripe_size = stripe_size as usize;
        let total = (self.k + self.m) as usize;
        let mut shards: Vec<Vec<u8>> = (0..total)
            .map(|idx| {
                let mut shard = vec![0u8; stripe_size];
                if idx < self.k as usize {
                    let start = idx * stripe_size;
                    if start < data.len() {
                        let end = (start + stripe_size).min(data.len());
                        shard[..end - start].copy_from_slice(&data[start..end]);
                    }
                }
                shard
            })
            .collect();
        self.rs
            .encode(&mut shards)
            .map_err(|e| CodecError::ShardLayout(e.to_string()))?;
        Ok(shards.into_iter().map(|s| frame(&s)).collect())
    }

    fn decode_chunk(
        &self,
        shards: &[Option<Bytes>],
        chunk_len: u64,
        stripe_size: u64,
    ) -> Result<Bytes, CodecError> {
        let total = (self.k + self.m) as usize;
        if shards.len() != total {
            return Err(CodecError::ShardLayout(format!(
                "expected {total} fragment slots, got {}",
                shards.len()
            )));
        }

        let available = shards.iter().filter(|s| s.is_some()).count() as u32;
        if available < self.k {
            return Err(CodecError::InsufficientShards {
                k: self.k,
                available,
            });
        }

        let mut buffers: Vec<Option<Vec<u8>>> =
            shards.iter().map(|s| s.as_ref().map(|b| b.to_vec())).collect();
        self.rs
            .reconstruct(&mut buffers)
            .map_err(|e| CodecError::ShardLayout(e.to_string()))?;

        let mut recovered = Vec::with_capacity(stripe_size as usize * self.k as usize);
        for shard in buffers.into_iter().take(self.k as usize) {
            recovered.extend_from_slice(&shard.unwrap_or_default());
        }
        recovered.truncate(chunk_len as usize);
        Ok(Bytes::from(recovered))
    }
}

/// Builds the right [`Codec`] for `code`, given the object's `k`/`m`.
pub fn codec_for(code: CodeKind, k: u32, m: u32) -> Result<Box<dyn Codec>, CodecError> {
    match code {
        CodeKind::Cp => Ok(Box::new(CpCodec { k })),
        CodeKind::Rs => Ok(Box::new(RsCodec::new(k, m)?)),
    }
}
