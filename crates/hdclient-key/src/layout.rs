use serde::{Deserialize, Serialize};

/// Fixed architectural alignment to which every chunk and stripe size is
/// rounded up. A multiple of the storage backend's preferred write unit.
pub const DATA_ALIGN: u64 = 4096;

/// Rounds `x` up to the nearest multiple of `a`. `a` must be non-zero.
pub fn align(x: u64, a: u64) -> u64 {
    debug_assert!(a > 0, "alignment must be non-zero");
    x.div_ceil(a) * a
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeKind {
    Cp,
    Rs,
}

impl CodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CodeKind::Cp => "CP",
            CodeKind::Rs => "RS",
        }
    }
}

/// One fragment's storage destination and backend key, as placed during a
/// PUT. `hostname`/`port` are only populated by the component that ran
/// placement (or later resolved a UUID against an endpoint map); a
/// freshly [`deserialize`](crate::FragmentsLayout::deserialize)d layout
/// always carries `None` for both until the caller resolves them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentLocator {
    pub uuid: String,
    pub hostname: Option<String>,
    pub port: Option<u16>,
    pub key: String,
    pub fragment_id: u32,
}

/// A chunk's placement: exactly `k` data locators and `m` coding locators,
/// in fragment-id order. A `None` entry means placement could not fill
/// that slot; callers decide whether that is fatal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkLocators {
    pub data: Vec<Option<FragmentLocator>>,
    pub coding: Vec<Option<FragmentLocator>>,
}

/// The fully decoded form of a self-describing object key. Produced by
/// [`crate::keygen`], consumed by the orchestrator's GET/DELETE paths.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentsLayout {
    pub scheme_version: u16,
    pub service_id: u64,
    pub size: u64,
    pub split_size: u64,
    pub n_chunks: u64,
    pub code: CodeKind,
    pub n_data_parts: u32,
    pub n_coding_parts: u32,
    pub stripe_size: u64,
    pub ctime: u64,
    pub rand: u32,
    pub chunks: Vec<ChunkLocators>,
}

impl FragmentsLayout {
    /// End offset (exclusive upper bound, inclusive of the last byte) of
    /// chunk `chunk_idx`, clamped to the object's declared size.
    pub fn chunk_end_offset(&self, chunk_idx: u64) -> u64 {
        self.size.min(self.split_size * (chunk_idx + 1))
    }

    /// Start offset of chunk `chunk_idx` within the object.
    pub fn chunk_start_offset(&self, chunk_idx: u64) -> u64 {
        self.split_size * chunk_idx
    }

    /// Length, in bytes, of chunk `chunk_idx` within the declared object
    /// size (the last chunk may be shorter than `split_size`).
    pub fn chunk_len(&self, chunk_idx: u64) -> u64 {
        self.chunk_end_offset(chunk_idx) - self.chunk_start_offset(chunk_idx)
    }

    /// Builds the backend key for fragment `(chunk_idx, fragment_id)`:
    /// `"{service_id}-{ctime}-{rand}-{end_offset}-{fragment_id}"`.
    pub fn fragment_key(&self, chunk_idx: u64, fragment_id: u32) -> String {
        format!(
            "{}-{}-{}-{}-{}",
            self.service_id,
            self.ctime,
            self.rand,
            self.chunk_end_offset(chunk_idx),
            fragment_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_rounds_up_to_multiple() {
        assert_eq!(align(0, DATA_ALIGN), 0);
        assert_eq!(align(1, DATA_ALIGN), DATA_ALIGN);
        assert_eq!(align(DATA_ALIGN, DATA_ALIGN), DATA_ALIGN);
        assert_eq!(align(DATA_ALIGN + 1, DATA_ALIGN), 2 * DATA_ALIGN);
        assert_eq!(align(10_000, DATA_ALIGN), 12_288);
    }
}
