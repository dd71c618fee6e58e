use hdclient_key::FragmentsLayout;

/// Chunk indices whose byte span overlaps the half-open object range
/// `[start, end)`. A GET for a byte range only decodes these chunks
/// rather than the whole object.
pub fn chunks_overlapping(layout: &FragmentsLayout, start: u64, end: u64) -> Vec<u64> {
    (0..layout.n_chunks)
        .filter(|&idx| layout.chunk_start_offset(idx) < end && layout.chunk_end_offset(idx) > start)
        .collect()
}

/// The portion of chunk `chunk_idx`'s own bytes (offsets local to the
/// chunk, not the object) that overlaps `[start, end)`.
pub fn local_range(layout: &FragmentsLayout, chunk_idx: u64, start: u64, end: u64) -> (u64, u64) {
    let chunk_start = layout.chunk_start_offset(chunk_idx);
    let chunk_end = layout.chunk_end_offset(chunk_idx);
    let local_start = start.max(chunk_start) - chunk_start;
    let local_end = end.min(chunk_end) - chunk_start;
    (local_start, local_end)
}
