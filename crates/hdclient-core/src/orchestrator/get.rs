use bytes::{Bytes, BytesMut};
use futures::future::join_all;

use hdclient_codec::{codec_for, range, verify};
use hdclient_fragio::{
    with_timeout, ClassifiedError, ContentSpec, FragmentAddress, FragmentIo, GetRequest, HYPERDRIVE_APPLICATION,
};
use hdclient_key::deserialize;

use crate::config::ValidatedConfig;
use crate::error::HdClientError;
use crate::intent::{ErrorAgent, FragmentRef, IntentRecord, IntentTopic};
use crate::outcomes::GetOutcome;

/// A fragment that did not contribute a healthy shard: either the fetch
/// itself was classified as an error, or the body arrived but failed
/// its CRC check. Both land in the repair intent; either can also be
/// the "worst observed" error surfaced to the caller.
enum Fault {
    Fetch(ClassifiedError),
    Corrupted {
        chunk_id: u64,
        fragment_id: u32,
        actual_crc: u32,
        expected_crc: u32,
    },
}

impl Fault {
    fn code(&self) -> u16 {
        match self {
            Fault::Fetch(e) => e.code(),
            Fault::Corrupted { .. } => 422,
        }
    }

    fn into_hd_error(self) -> HdClientError {
        match self {
            Fault::Fetch(e) => HdClientError::Fragment(e),
            Fault::Corrupted {
                chunk_id,
                fragment_id,
                actual_crc,
                expected_crc,
            } => HdClientError::CorruptedData {
                chunk_id,
                fragment_id,
                actual_crc,
                expected_crc,
            },
        }
    }
}

/// Issue → Collect → Classify → Respond → Persist intent, for GET.
/// `object_range` is an inclusive `[start, end]` byte range, HTTP-style
/// (matching §8 scenario S5); `None` reads the whole object.
pub async fn get<F: FragmentIo, E: ErrorAgent>(
    config: &ValidatedConfig,
    fragio: &F,
    error_agent: &E,
    raw_key: &str,
    object_range: Option<(u64, u64)>,
) -> GetOutcome {
    let layout = match deserialize(raw_key, config.service_id) {
        Ok(layout) => layout,
        Err(_) => {
            return GetOutcome {
                body: Err(HdClientError::ParseError),
                failed_to_persist: false,
            }
        }
    };

    let (start, end_exclusive) = match object_range {
        Some((start, end)) => {
            if layout.size == 0 || start >= layout.size {
                return GetOutcome {
                    body: Err(HdClientError::InvalidRange(format!(
                        "start {start} is past object size {}",
                        layout.size
                    ))),
                    failed_to_persist: false,
                };
            }
            let clamped_end = end.min(layout.size - 1);
            (start, clamped_end + 1)
        }
        None => (0, layout.size),
    };

    let active_chunks: Vec<u64> = if layout.size == 0 {
        (0..layout.n_chunks).collect()
    } else {
        range::chunks_overlapping(&layout, start, end_exclusive)
    };

    let k = layout.n_data_parts;
    let m = layout.n_coding_parts;
    let n_fragments = (k + m) as usize;
    let codec = match codec_for(layout.code, k, m) {
        Ok(codec) => codec,
        Err(err) => {
            return GetOutcome {
                body: Err(HdClientError::InternalError(format!("codec init failed: {err}"))),
                failed_to_persist: false,
            }
        }
    };

    let mut futures = Vec::with_capacity(active_chunks.len() * n_fragments);
    for &chunk_idx in &active_chunks {
        for fragment_id in 0..n_fragments as u32 {
            let address = FragmentAddress { chunk_idx, fragment_id };
            let req = GetRequest {
                address,
                fragment_key: layout.fragment_key(chunk_idx, fragment_id),
                accept: ContentSpec::new(HYPERDRIVE_APPLICATION).with_section("data", None),
                range: None,
            };
            let timeout = config.request_timeout;
            futures.push(async move { (address, with_timeout(timeout, fragio.get(req)).await) });
        }
    }
    let results = join_all(futures).await;

    let mut shards_by_chunk: std::collections::HashMap<u64, Vec<Option<Bytes>>> = active_chunks
        .iter()
        .map(|&idx| (idx, vec![None; n_fragments]))
        .collect();
    let mut faults: Vec<Fault> = Vec::new();
    let mut repair_fragments: Vec<FragmentRef> = Vec::new();

    for (address, result) in results {
        match result {
            Ok(resp) => match verify(&resp.body, address.chunk_idx, address.fragment_id) {
                Ok(payload) => {
                    shards_by_chunk.get_mut(&address.chunk_idx).unwrap()[address.fragment_id as usize] = Some(payload);
                }
                Err(err) => {
                    let (actual_crc, expected_crc) = match err {
                        hdclient_codec::CodecError::CorruptedData {
                            actual_crc,
                            expected_crc,
                            ..
                        } => (actual_crc, expected_crc),
                        _ => (0, 0),
                    };
                    faults.push(Fault::Corrupted {
                        chunk_id: address.chunk_idx,
                        fragment_id: address.fragment_id,
                        actual_crc,
                        expected_crc,
                    });
                    repair_fragments.push(FragmentRef {
                        chunk: address.chunk_idx,
                        fragment: address.fragment_id,
                    });
                }
            },
            Err(err) => {
                faults.push(Fault::Fetch(err));
                repair_fragments.push(FragmentRef {
                    chunk: address.chunk_idx,
                    fragment: address.fragment_id,
                });
            }
        }
    }

    let mut out = BytesMut::new();
    let mut decode_error: Option<HdClientError> = None;
    for &chunk_idx in &active_chunks {
        let shards = &shards_by_chunk[&chunk_idx];
        let healthy = shards.iter().filter(|s| s.is_some()).count() as u32;
        if healthy < k {
            continue;
        }
        match codec.decode_chunk(shards, layout.chunk_len(chunk_idx), layout.stripe_size) {
            Ok(chunk_bytes) => {
                let (local_start, local_end) = range::local_range(&layout, chunk_idx, start, end_exclusive);
                out.extend_from_slice(&chunk_bytes[local_start as usize..local_end as usize]);
            }
            Err(err) => {
                decode_error = Some(HdClientError::InternalError(format!("decode failed: {err}")));
            }
        }
    }

    let any_chunk_unrecoverable = active_chunks
        .iter()
        .any(|idx| shards_by_chunk[idx].iter().filter(|s| s.is_some()).count() < k as usize);

    let mut result = if any_chunk_unrecoverable || decode_error.is_some() {
        Err(decode_error.unwrap_or_else(|| worst_fault(faults.drain(..)).unwrap_or(HdClientError::InternalError(
            "GET failed without a classified fragment fault".to_string(),
        ))))
    } else {
        Ok(out.freeze())
    };

    let mut failed_to_persist = false;
    if !repair_fragments.is_empty() {
        let record = IntentRecord {
            raw_key: raw_key.to_string(),
            fragments: repair_fragments,
            version: None,
        };
        if let Err(underlying) = error_agent.send(IntentTopic::Repair, vec![record]).await {
            if result.is_err() {
                result = Err(HdClientError::InternalError(format!(
                    "Failed to persist fragments to repair: {underlying}"
                )));
            } else {
                failed_to_persist = true;
            }
        }
    }

    GetOutcome {
        body: result,
        failed_to_persist,
    }
}

fn worst_fault(faults: impl Iterator<Item = Fault>) -> Option<HdClientError> {
    faults
        .max_by_key(|f| {
            let code = f.code();
            (code >= 500, code)
        })
        .map(Fault::into_hd_error)
}
