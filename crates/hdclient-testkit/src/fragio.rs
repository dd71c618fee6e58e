use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use hdclient_fragio::{
    ClassifiedError, ContentSpec, DeleteRequest, FragmentAddress, FragmentIo, GetRequest, GetResponse, PutRequest,
};

#[derive(Clone)]
struct StoredFragment {
    content_type: ContentSpec,
    body: Bytes,
}

#[derive(Default)]
struct State {
    store: HashMap<String, StoredFragment>,
    put_overrides: HashMap<(u64, u32), ClassifiedError>,
    get_overrides: HashMap<(u64, u32), ClassifiedError>,
    delete_overrides: HashMap<(u64, u32), ClassifiedError>,
    corrupt: HashSet<(u64, u32)>,
    puts: Vec<FragmentAddress>,
    gets: Vec<FragmentAddress>,
    deletes: Vec<FragmentAddress>,
}

/// An in-memory [`FragmentIo`] double backed by a plain key/value store.
/// PUT/GET/DELETE behave like a real fragment server by default; tests
/// script deviations per `(chunk_idx, fragment_id)` ahead of time —
/// a forced error, or a CRC-breaking bit flip on the next read — each
/// of which fires exactly once before the double reverts to its
/// default, honest behavior.
#[derive(Default)]
pub struct ScriptedFragmentIo {
    state: Mutex<State>,
}

impl ScriptedFragmentIo {
    pub fn new() -> Self {
        ScriptedFragmentIo::default()
    }

    pub fn fail_put(&self, chunk_idx: u64, fragment_id: u32, err: ClassifiedError) {
        self.state.lock().unwrap().put_overrides.insert((chunk_idx, fragment_id), err);
    }

    pub fn fail_get(&self, chunk_idx: u64, fragment_id: u32, err: ClassifiedError) {
        self.state.lock().unwrap().get_overrides.insert((chunk_idx, fragment_id), err);
    }

    pub fn fail_delete(&self, chunk_idx: u64, fragment_id: u32, err: ClassifiedError) {
        self.state.lock().unwrap().delete_overrides.insert((chunk_idx, fragment_id), err);
    }

    /// Flips a bit in the next GET response for this fragment, so the
    /// orchestrator's CRC check fails on an otherwise present fragment.
    pub fn corrupt(&self, chunk_idx: u64, fragment_id: u32) {
        self.state.lock().unwrap().corrupt.insert((chunk_idx, fragment_id));
    }

    pub fn put_calls(&self) -> Vec<FragmentAddress> {
        self.state.lock().unwrap().puts.clone()
    }

    pub fn get_calls(&self) -> Vec<FragmentAddress> {
        self.state.lock().unwrap().gets.clone()
    }

    pub fn delete_calls(&self) -> Vec<FragmentAddress> {
        self.state.lock().unwrap().deletes.clone()
    }

    pub fn contains(&self, fragment_key: &str) -> bool {
        self.state.lock().unwrap().store.contains_key(fragment_key)
    }
}

#[async_trait]
impl FragmentIo for ScriptedFragmentIo {
    async fn put(&self, req: PutRequest) -> Result<(), ClassifiedError> {
        let key = (req.address.chunk_idx, req.address.fragment_id);
        let mut state = self.state.lock().unwrap();
        state.puts.push(req.address);
        if let Some(err) = state.put_overrides.remove(&key) {
            return Err(err);
        }
        state.store.insert(
            req.fragment_key,
            StoredFragment {
                content_type: req.content_type,
                body: req.body,
            },
        );
        Ok(())
    }

    async fn get(&self, req: GetRequest) -> Result<GetResponse, ClassifiedError> {
        let key = (req.address.chunk_idx, req.address.fragment_id);
        let mut state = self.state.lock().unwrap();
        state.gets.push(req.address);
        if let Some(err) = state.get_overrides.remove(&key) {
            return Err(err);
        }
        let stored = state
            .store
            .get(&req.fragment_key)
            .cloned()
            .ok_or(ClassifiedError::HttpError { status: 404 })?;
        let body = if state.corrupt.remove(&key) {
            let mut bytes = stored.body.to_vec();
            if let Some(first) = bytes.first_mut() {
                *first ^= 0xff;
            }
            Bytes::from(bytes)
        } else {
            stored.body
        };
        Ok(GetResponse {
            content_type: stored.content_type,
            body,
        })
    }

    async fn delete(&self, req: DeleteRequest) -> Result<(), ClassifiedError> {
        let key = (req.address.chunk_idx, req.address.fragment_id);
        let mut state = self.state.lock().unwrap();
        state.deletes.push(req.address);
        if let Some(err) = state.delete_overrides.remove(&key) {
            return Err(err);
        }
        state.store.remove(&req.fragment_key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdclient_fragio::HYPERDRIVE_APPLICATION;

    fn request(chunk_idx: u64, fragment_id: u32, body: &[u8]) -> PutRequest {
        PutRequest {
            address: FragmentAddress { chunk_idx, fragment_id },
            fragment_key: format!("k-{chunk_idx}-{fragment_id}"),
            content_type: ContentSpec::new(HYPERDRIVE_APPLICATION),
            body: Bytes::copy_from_slice(body),
        }
    }

    #[tokio::test]
    async fn round_trips_a_stored_fragment() {
        let io = ScriptedFragmentIo::new();
        io.put(request(0, 0, b"hello")).await.unwrap();
        let resp = io
            .get(GetRequest {
                address: FragmentAddress { chunk_idx: 0, fragment_id: 0 },
                fragment_key: "k-0-0".to_string(),
                accept: ContentSpec::new(HYPERDRIVE_APPLICATION),
                range: None,
            })
            .await
            .unwrap();
        assert_eq!(&resp.body[..], b"hello");
    }

    #[tokio::test]
    async fn get_on_missing_fragment_is_404() {
        let io = ScriptedFragmentIo::new();
        let err = io
            .get(GetRequest {
                address: FragmentAddress { chunk_idx: 0, fragment_id: 0 },
                fragment_key: "missing".to_string(),
                accept: ContentSpec::new(HYPERDRIVE_APPLICATION),
                range: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err, ClassifiedError::HttpError { status: 404 });
    }

    #[tokio::test]
    async fn scripted_failure_fires_once_then_reverts() {
        let io = ScriptedFragmentIo::new();
        io.put(request(0, 0, b"hello")).await.unwrap();
        io.fail_get(0, 0, ClassifiedError::TimeoutError { timeout_ms: 50 });
        let req = GetRequest {
            address: FragmentAddress { chunk_idx: 0, fragment_id: 0 },
            fragment_key: "k-0-0".to_string(),
            accept: ContentSpec::new(HYPERDRIVE_APPLICATION),
            range: None,
        };
        assert!(io.get(req.clone()).await.is_err());
        assert!(io.get(req).await.is_ok());
    }

    #[tokio::test]
    async fn corrupt_flips_a_bit_in_the_next_read_only() {
        let io = ScriptedFragmentIo::new();
        io.put(request(0, 0, b"hello")).await.unwrap();
        io.corrupt(0, 0);
        let req = GetRequest {
            address: FragmentAddress { chunk_idx: 0, fragment_id: 0 },
            fragment_key: "k-0-0".to_string(),
            accept: ContentSpec::new(HYPERDRIVE_APPLICATION),
            range: None,
        };
        let corrupted = io.get(req.clone()).await.unwrap();
        assert_ne!(&corrupted.body[..], b"hello");
        let clean = io.get(req).await.unwrap();
        assert_eq!(&clean.body[..], b"hello");
    }
}
