use hdclient_fragio::ClassifiedError;

/// Outcome of a single fragment op, as recorded into its chunk's
/// `statuses[fragmentId]` slot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FragmentStatus {
    pub ok: bool,
    pub error: Option<ClassifiedError>,
}

/// Per-chunk counters and per-fragment detail for one operation.
#[derive(Clone, Debug, Default)]
pub struct ChunkStatus {
    pub n_ok: u32,
    pub n_error: u32,
    pub n_timeout: u32,
    pub statuses: Vec<FragmentStatus>,
}

impl ChunkStatus {
    pub fn new(n_fragments: usize) -> Self {
        ChunkStatus {
            n_ok: 0,
            n_error: 0,
            n_timeout: 0,
            statuses: vec![FragmentStatus::default(); n_fragments],
        }
    }

    pub fn record_ok(&mut self, fragment_id: usize) {
        self.n_ok += 1;
        self.statuses[fragment_id].ok = true;
    }

    pub fn record_error(&mut self, fragment_id: usize, error: ClassifiedError) {
        if matches!(error, ClassifiedError::TimeoutError { .. }) {
            self.n_timeout += 1;
        } else {
            self.n_error += 1;
        }
        self.statuses[fragment_id].error = Some(error);
    }

    pub fn errors(&self) -> impl Iterator<Item = &ClassifiedError> {
        self.statuses.iter().filter_map(|s| s.error.as_ref())
    }
}

/// Owned exclusively by one operation invocation; concurrent fragment
/// callbacks only ever mutate their own `statuses[chunkIdx][fragmentId]`
/// slot and the chunk's monotonic counters, so no lock is held across a
/// suspension point.
#[derive(Clone, Debug, Default)]
pub struct OpCtx {
    pub status: Vec<ChunkStatus>,
    pub n_pending: usize,
    pub failed_to_persist: bool,
}

impl OpCtx {
    pub fn new(n_chunks: usize, n_fragments_per_chunk: usize) -> Self {
        OpCtx {
            status: (0..n_chunks).map(|_| ChunkStatus::new(n_fragments_per_chunk)).collect(),
            n_pending: 0,
            failed_to_persist: false,
        }
    }
}
