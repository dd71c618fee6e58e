use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::content::ContentSpec;
use crate::error::ClassifiedError;

/// Identifies which fragment a request targets, for logging and for
/// attaching the right slot in the caller's `OpCtx`-equivalent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FragmentAddress {
    pub chunk_idx: u64,
    pub fragment_id: u32,
}

#[derive(Clone, Debug)]
pub struct PutRequest {
    pub address: FragmentAddress,
    pub fragment_key: String,
    pub content_type: ContentSpec,
    pub body: Bytes,
}

#[derive(Clone, Debug)]
pub struct GetRequest {
    pub address: FragmentAddress,
    pub fragment_key: String,
    pub accept: ContentSpec,
    /// Byte range local to the fragment, pushed down from the
    /// object-level range requested at the orchestrator.
    pub range: Option<(u64, u64)>,
}

#[derive(Clone, Debug)]
pub struct DeleteRequest {
    pub address: FragmentAddress,
    pub fragment_key: String,
}

#[derive(Clone, Debug)]
pub struct GetResponse {
    pub content_type: ContentSpec,
    pub body: Bytes,
}

/// The external-boundary contract: one outbound request per call,
/// resolving exactly once to either a classified success or a
/// [`ClassifiedError`]. Concrete HTTP transports are deliberately out of
/// scope here; implementors (production HTTP client, or an in-memory
/// double for tests) live elsewhere.
#[async_trait]
pub trait FragmentIo: Send + Sync {
    async fn put(&self, req: PutRequest) -> Result<(), ClassifiedError>;
    async fn get(&self, req: GetRequest) -> Result<GetResponse, ClassifiedError>;
    async fn delete(&self, req: DeleteRequest) -> Result<(), ClassifiedError>;
}

/// Bounds `fut` to `timeout`, producing [`ClassifiedError::TimeoutError`]
/// if it hasn't resolved in time. `timeout == Duration::ZERO` disables
/// the bound entirely, matching `timeoutMs = 0`. Transport implementors
/// call this around their own socket work; it is the "wrapper" that
/// guarantees a single outcome per request even when the underlying I/O
/// never completes.
pub async fn with_timeout<F, T>(timeout: Duration, fut: F) -> Result<T, ClassifiedError>
where
    F: Future<Output = Result<T, ClassifiedError>>,
{
    if timeout.is_zero() {
        return fut.await;
    }
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(ClassifiedError::TimeoutError {
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_timeout_waits_forever_within_reason() {
        let result = with_timeout(Duration::ZERO, async { Ok::<_, ClassifiedError>(42) }).await;
        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn timeout_fires_when_future_never_resolves() {
        let result = with_timeout(Duration::from_millis(5), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, ClassifiedError>(())
        })
        .await;
        assert_eq!(
            result,
            Err(ClassifiedError::TimeoutError { timeout_ms: 5 })
        );
    }
}
