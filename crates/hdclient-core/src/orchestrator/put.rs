use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use futures::future::join_all;
use futures::{Stream, StreamExt};
use rand::rngs::StdRng;
use rand::SeedableRng;

use hdclient_codec::codec_for;
use hdclient_fragio::{
    with_timeout, ClassifiedError, ContentSpec, FragmentAddress, FragmentIo, PutRequest, HYPERDRIVE_APPLICATION,
};
use hdclient_key::{keygen, serialize, PlacementSlots};
use hdclient_placement::select as place_select;

use crate::config::ValidatedConfig;
use crate::error::{worst_classified, HdClientError};
use crate::intent::{ErrorAgent, FragmentRef, IntentRecord, IntentTopic};
use crate::opctx::OpCtx;
use crate::outcomes::{KeyContext, PutOutcome};

/// A PUT body the caller feeds in chunk by chunk rather than handing over
/// pre-buffered. Mirrors the reference system's lazy, pull-based input
/// sequence (`spec.md` §5 "Backpressure") — the orchestrator only ever
/// holds one chunk's worth of bytes at a time, never the whole object.
pub type PutBody = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Wraps an already-materialized buffer as a one-item [`PutBody`], for
/// callers that have the whole object in memory (small objects, tests).
pub fn body_from_bytes(data: Bytes) -> PutBody {
    Box::pin(futures::stream::once(async move { Ok(data) }))
}

/// Issue → Collect → Classify → Respond → Persist intent, for PUT.
///
/// Chunks are pulled from `body` and dispatched one at a time: every
/// fragment write for chunk `i` is awaited before chunk `i + 1` is
/// pulled from the stream, so "already-started fragments" at the moment
/// of a stream error is an exact, fully-resolved set rather than a set
/// of futures that merely exist but never polled.
pub async fn put<F: FragmentIo, E: ErrorAgent>(
    config: &ValidatedConfig,
    fragio: &F,
    error_agent: &E,
    key_context: KeyContext,
    size: u64,
    mut body: PutBody,
) -> PutOutcome {
    let rule = match config.codes.match_for(&key_context.bucket_name, &key_context.object_key) {
        Ok(rule) => rule,
        Err(err) => {
            return PutOutcome {
                raw_key: None,
                result: Err(err),
                failed_to_persist: false,
            }
        }
    };
    let k = rule.data_parts;
    let m = rule.coding_parts;
    let code = rule.code;

    let mut placement_rng = StdRng::from_entropy();
    let mut keygen_rng = StdRng::from_entropy();
    let ctime_millis = now_millis();

    let layout = keygen(
        config.service_id,
        config.min_split_size,
        size,
        code,
        k,
        m,
        ctime_millis,
        None,
        |k, m| {
            let placed = place_select(&config.topology, k, m, &mut placement_rng);
            PlacementSlots {
                data: placed.data,
                coding: placed.coding,
            }
        },
        &mut keygen_rng,
    );
    let raw_key = serialize(&layout);

    let codec = match codec_for(code, k, m) {
        Ok(codec) => codec,
        Err(err) => {
            return PutOutcome {
                raw_key: Some(raw_key),
                result: Err(HdClientError::InternalError(format!("codec init failed: {err}"))),
                failed_to_persist: false,
            }
        }
    };

    let n_fragments = (k + m) as usize;
    let mut opctx = OpCtx::new(layout.n_chunks as usize, n_fragments);
    let mut committed_fragments: Vec<FragmentRef> = Vec::new();
    let mut leftover = BytesMut::new();

    for chunk_idx in 0..layout.n_chunks {
        let chunk_len = layout.chunk_len(chunk_idx) as usize;
        let chunk_bytes = match pull_chunk(&mut body, &mut leftover, chunk_len).await {
            Ok(bytes) => bytes,
            Err(io_err) => {
                return abort_for_stream_error(error_agent, raw_key, &key_context, committed_fragments, io_err).await;
            }
        };

        let fragments = match codec.encode_chunk(chunk_idx, &chunk_bytes, layout.stripe_size) {
            Ok(fragments) => fragments,
            Err(err) => {
                return PutOutcome {
                    raw_key: Some(raw_key),
                    result: Err(HdClientError::InternalError(format!("encode failed: {err}"))),
                    failed_to_persist: false,
                }
            }
        };

        let mut chunk_futures = Vec::with_capacity(n_fragments);
        for (fragment_id, payload) in fragments.into_iter().enumerate() {
            let address = FragmentAddress {
                chunk_idx,
                fragment_id: fragment_id as u32,
            };
            committed_fragments.push(FragmentRef {
                chunk: chunk_idx,
                fragment: fragment_id as u32,
            });
            let req = PutRequest {
                address,
                fragment_key: layout.fragment_key(chunk_idx, fragment_id as u32),
                content_type: ContentSpec::new(HYPERDRIVE_APPLICATION).with_section("data", Some(payload.len() as u64)),
                body: payload,
            };
            let timeout = config.request_timeout;
            chunk_futures.push(async move { (address, with_timeout(timeout, fragio.put(req)).await) });
        }

        opctx.n_pending += chunk_futures.len();
        let results = join_all(chunk_futures).await;
        opctx.n_pending -= results.len();

        for (address, result) in results {
            let chunk = &mut opctx.status[address.chunk_idx as usize];
            match result {
                Ok(()) => chunk.record_ok(address.fragment_id as usize),
                Err(err) => chunk.record_error(address.fragment_id as usize, err),
            }
        }
    }

    let timeout_threshold = n_fragments.div_ceil(2) as u32;
    let mut chunk_succeeded = Vec::with_capacity(opctx.status.len());
    for chunk in &opctx.status {
        chunk_succeeded.push(chunk.n_error == 0 && chunk.n_timeout < timeout_threshold);
    }
    let overall_success = chunk_succeeded.iter().all(|&ok| ok);

    let (topic, fragments) = if !overall_success {
        (IntentTopic::Delete, committed_fragments)
    } else {
        let fragments = opctx
            .status
            .iter()
            .enumerate()
            .flat_map(|(chunk_idx, chunk)| {
                chunk
                    .statuses
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| matches!(s.error, Some(ClassifiedError::TimeoutError { .. })))
                    .map(move |(fragment_id, _)| FragmentRef {
                        chunk: chunk_idx as u64,
                        fragment: fragment_id as u32,
                    })
            })
            .collect::<Vec<_>>();
        (IntentTopic::Repair, fragments)
    };

    let mut result = if overall_success {
        Ok(())
    } else {
        Err(overall_fragment_error(&opctx))
    };
    let mut failed_to_persist = false;

    if !fragments.is_empty() {
        let record = IntentRecord {
            raw_key: raw_key.clone(),
            fragments,
            version: key_context.version.clone(),
        };
        if let Err(underlying) = error_agent.send(topic, vec![record]).await {
            failed_to_persist = true;
            result = Err(HdClientError::InternalError(format!(
                "Failed to persist bad fragments: {underlying}"
            )));
        }
    }

    PutOutcome {
        raw_key: Some(raw_key),
        result,
        failed_to_persist,
    }
}

/// Pulls exactly `chunk_len` bytes off `body`, carrying any bytes a
/// stream item over-delivered past a chunk boundary forward in
/// `leftover` for the next call. Never buffers more than one chunk plus
/// whatever the stream's own item boundaries straddle.
async fn pull_chunk(body: &mut PutBody, leftover: &mut BytesMut, chunk_len: usize) -> Result<Bytes, std::io::Error> {
    let mut chunk = BytesMut::with_capacity(chunk_len);
    while chunk.len() < chunk_len {
        if !leftover.is_empty() {
            let need = chunk_len - chunk.len();
            let take = need.min(leftover.len());
            chunk.extend_from_slice(&leftover[..take]);
            let _ = leftover.split_to(take);
            continue;
        }
        match body.next().await {
            Some(Ok(bytes)) => leftover.extend_from_slice(&bytes),
            Some(Err(err)) => return Err(err),
            None => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("body stream ended after {} of {chunk_len} declared bytes", chunk.len()),
                ))
            }
        }
    }
    Ok(chunk.freeze())
}

/// Spec §4.E.1 step 9: the input body stream errored mid-PUT. Every
/// fragment dispatched for a chunk already pulled off the stream is
/// "already started" and gets a delete intent; the caller sees
/// `PUTError(500)`.
async fn abort_for_stream_error<E: ErrorAgent>(
    error_agent: &E,
    raw_key: String,
    key_context: &KeyContext,
    committed_fragments: Vec<FragmentRef>,
    io_err: std::io::Error,
) -> PutOutcome {
    let mut failed_to_persist = false;
    if !committed_fragments.is_empty() {
        let record = IntentRecord {
            raw_key: raw_key.clone(),
            fragments: committed_fragments,
            version: key_context.version.clone(),
        };
        if error_agent.send(IntentTopic::Delete, vec![record]).await.is_err() {
            failed_to_persist = true;
        }
    }
    PutOutcome {
        raw_key: Some(raw_key),
        result: Err(HdClientError::Fragment(ClassifiedError::PutError {
            description: io_err.to_string(),
        })),
        failed_to_persist,
    }
}

fn overall_fragment_error(opctx: &OpCtx) -> HdClientError {
    let worst = worst_classified(opctx.status.iter().flat_map(|c| c.errors()));
    match worst {
        Some(err) => HdClientError::Fragment(err),
        None => HdClientError::InternalError("PUT failed without a classified fragment error".to_string()),
    }
}

fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
