use futures::future::join_all;

use hdclient_fragio::{with_timeout, ClassifiedError, DeleteRequest, FragmentAddress, FragmentIo};
use hdclient_key::deserialize;

use crate::config::ValidatedConfig;
use crate::error::{worst_classified, HdClientError};
use crate::intent::{ErrorAgent, FragmentRef, IntentRecord, IntentTopic};
use crate::outcomes::DeleteOutcome;

/// Issue → Collect → Classify → Respond → Persist intent, for DELETE.
pub async fn delete<F: FragmentIo, E: ErrorAgent>(
    config: &ValidatedConfig,
    fragio: &F,
    error_agent: &E,
    raw_key: &str,
) -> DeleteOutcome {
    let layout = match deserialize(raw_key, config.service_id) {
        Ok(layout) => layout,
        Err(_) => {
            return DeleteOutcome {
                result: Err(HdClientError::ParseError),
                failed_to_persist: false,
            }
        }
    };

    let n_fragments = (layout.n_data_parts + layout.n_coding_parts) as usize;
    let mut futures = Vec::with_capacity(layout.n_chunks as usize * n_fragments);
    for chunk_idx in 0..layout.n_chunks {
        for fragment_id in 0..n_fragments as u32 {
            let address = FragmentAddress { chunk_idx, fragment_id };
            let req = DeleteRequest {
                address,
                fragment_key: layout.fragment_key(chunk_idx, fragment_id),
            };
            let timeout = config.request_timeout;
            futures.push(async move { (address, with_timeout(timeout, fragio.delete(req)).await) });
        }
    }
    let results = join_all(futures).await;

    let mut dirty_per_chunk = vec![0u32; layout.n_chunks as usize];
    let mut dirty_fragments = Vec::new();
    let mut dirty_errors = Vec::new();
    for (address, result) in results {
        let is_clean = matches!(result, Ok(()) | Err(ClassifiedError::HttpError { status: 404 }));
        if !is_clean {
            dirty_per_chunk[address.chunk_idx as usize] += 1;
            dirty_fragments.push(FragmentRef {
                chunk: address.chunk_idx,
                fragment: address.fragment_id,
            });
            if let Err(err) = result {
                dirty_errors.push(err);
            }
        }
    }

    let any_chunk_fully_dirty = dirty_per_chunk.iter().any(|&n| n as usize == n_fragments);
    let mut result = if any_chunk_fully_dirty {
        let worst = worst_classified(dirty_errors.iter()).unwrap_or(ClassifiedError::HttpError { status: 500 });
        Err(HdClientError::Fragment(worst))
    } else {
        Ok(())
    };

    let mut failed_to_persist = false;
    if !dirty_fragments.is_empty() {
        let record = IntentRecord {
            raw_key: raw_key.to_string(),
            fragments: dirty_fragments,
            version: None,
        };
        if let Err(underlying) = error_agent.send(IntentTopic::Delete, vec![record]).await {
            failed_to_persist = true;
            result = Err(HdClientError::InternalError(format!(
                "Failed to persist orphaned fragments: {underlying}"
            )));
        }
    }

    DeleteOutcome {
        result,
        failed_to_persist,
    }
}
