use rand::RngCore;

use crate::error::KeySchemeDeserializeError;
use crate::layout::{align, CodeKind, ChunkLocators, FragmentLocator, FragmentsLayout, DATA_ALIGN};

const SECTION_SEP: char = '#';
const SUBSECTION_SEP: char = ',';

/// Per-chunk placement result, as produced by the placement component for
/// one `(k, m)` draw. A `None` slot means the topology could not place
/// that fragment; `keygen` carries the hole through into the layout.
#[derive(Clone, Debug, Default)]
pub struct PlacementSlots {
    pub data: Vec<Option<String>>,
    pub coding: Vec<Option<String>>,
}

/// Computes `(split_size, stripe_size)` for an object of `size` bytes
/// under a minimum chunk size of `min_split_size` and `k` data parts.
///
/// `min_split_size == 0` disables splitting: everything lands in a
/// single chunk sized to the (aligned) object itself. Otherwise, objects
/// at or under the minimum get one chunk sized to fit them; larger
/// objects are split into fixed-size chunks pinned at the aligned
/// minimum.
pub fn split_size(min_split_size: u64, size: u64, code: CodeKind, k: u32) -> (u64, u64) {
    let split_size = if min_split_size == 0 {
        align(size, DATA_ALIGN).max(DATA_ALIGN)
    } else if size <= min_split_size {
        align(min_split_size, DATA_ALIGN).max(align(size, DATA_ALIGN))
    } else {
        align(min_split_size, DATA_ALIGN)
    };

    let stripe_size = match code {
        CodeKind::Cp => 0,
        CodeKind::Rs => align(split_size.div_ceil(u64::from(k)), DATA_ALIGN),
    };

    (split_size, stripe_size)
}

/// Number of chunks an object of `size` bytes splits into at `split_size`.
/// Always at least 1, even for a zero-byte object.
pub fn n_chunks(size: u64, split_size: u64) -> u64 {
    if size == 0 {
        1
    } else {
        size.div_ceil(split_size).max(1)
    }
}

/// Builds a [`FragmentsLayout`] for a freshly-placed PUT.
///
/// `place` is called once per chunk with `(k, m)` and must return the
/// placement slots for that chunk; this keeps the key scheme decoupled
/// from the placement component's topology types, matching the
/// capability-injection style used throughout this codebase.
#[allow(clippy::too_many_arguments)]
pub fn keygen(
    service_id: u64,
    min_split_size: u64,
    size: u64,
    code: CodeKind,
    k: u32,
    m: u32,
    ctime_millis: u64,
    opt_rand: Option<u32>,
    mut place: impl FnMut(u32, u32) -> PlacementSlots,
    rng: &mut dyn RngCore,
) -> FragmentsLayout {
    let (split_size_bytes, stripe_size) = split_size(min_split_size, size, code, k);
    let chunks_count = n_chunks(size, split_size_bytes);
    let rand_tag = opt_rand.unwrap_or_else(|| rng.next_u32());

    let mut layout = FragmentsLayout {
        scheme_version: 1,
        service_id,
        size,
        split_size: split_size_bytes,
        n_chunks: chunks_count,
        code,
        n_data_parts: k,
        n_coding_parts: m,
        stripe_size,
        ctime: ctime_millis,
        rand: rand_tag,
        chunks: Vec::with_capacity(chunks_count as usize),
    };

    for chunk_idx in 0..chunks_count {
        let slots = place(k, m);
        let data = slots
            .data
            .into_iter()
            .enumerate()
            .map(|(i, uuid)| {
                uuid.map(|uuid| FragmentLocator {
                    key: layout.fragment_key(chunk_idx, i as u32),
                    fragment_id: i as u32,
                    uuid,
                    hostname: None,
                    port: None,
                })
            })
            .collect();
        let coding = slots
            .coding
            .into_iter()
            .enumerate()
            .map(|(i, uuid)| {
                let fragment_id = k + i as u32;
                uuid.map(|uuid| FragmentLocator {
                    key: layout.fragment_key(chunk_idx, fragment_id),
                    fragment_id,
                    uuid,
                    hostname: None,
                    port: None,
                })
            })
            .collect();
        layout.chunks.push(ChunkLocators { data, coding });
    }

    layout
}

/// Serializes a layout into its flat ASCII key form:
/// `v#serviceId#split#codeSpec#genobj#rand#loc0#loc1#…`.
///
/// Only the UUID of each fragment survives serialization; hostname/port
/// are resolved at use-time from a UUID→endpoint map the caller owns.
pub fn serialize(layout: &FragmentsLayout) -> String {
    let mut parts = vec![
        layout.scheme_version.to_string(),
        layout.service_id.to_string(),
        format!("{}{}{}", layout.size, SUBSECTION_SEP, layout.split_size),
        match layout.code {
            CodeKind::Cp => format!("CP{}{}", SUBSECTION_SEP, layout.n_data_parts),
            CodeKind::Rs => format!(
                "RS{}{}{}{}",
                SUBSECTION_SEP, layout.n_data_parts, SUBSECTION_SEP, layout.n_coding_parts
            ),
        },
        layout.ctime.to_string(),
        layout.rand.to_string(),
    ];

    for chunk in &layout.chunks {
        for loc in chunk.data.iter().chain(chunk.coding.iter()) {
            parts.push(loc.as_ref().map(|l| l.uuid.clone()).unwrap_or_default());
        }
    }

    parts.join(&SECTION_SEP.to_string())
}

fn expected_code_spec(code: CodeKind, k: u32, m: u32) -> String {
    match code {
        CodeKind::Cp => format!("CP,{k}"),
        CodeKind::Rs => format!("RS,{k},{m}"),
    }
}

/// Parses a raw key back into a [`FragmentsLayout`], or fails with the
/// message taxonomy in [`KeySchemeDeserializeError`].
///
/// `expected_service_id` is the namespace this client instance is
/// configured for; a key minted under a different service id is
/// rejected rather than silently accepted cross-tenant.
pub fn deserialize(
    s: &str,
    expected_service_id: u64,
) -> Result<FragmentsLayout, KeySchemeDeserializeError> {
    let mut sections = s.split(SECTION_SEP);

    let version_str = sections.next().unwrap_or_default();
    let version: u16 = version_str
        .parse()
        .map_err(|_| KeySchemeDeserializeError::UnknownVersion(version_str.to_string()))?;
    if version != 1 {
        return Err(KeySchemeDeserializeError::UnknownVersion(
            version_str.to_string(),
        ));
    }

    let service_id_str = sections
        .next()
        .ok_or_else(|| KeySchemeDeserializeError::UnknownServiceId(String::new()))?;
    let service_id: u64 = service_id_str
        .parse()
        .map_err(|_| KeySchemeDeserializeError::UnknownServiceId(service_id_str.to_string()))?;
    if service_id != expected_service_id {
        return Err(KeySchemeDeserializeError::UnknownServiceId(
            service_id_str.to_string(),
        ));
    }

    let split_str = sections
        .next()
        .ok_or(KeySchemeDeserializeError::NoSplitSection)?;
    let (size, split_size_bytes) = {
        let mut subs = split_str.split(SUBSECTION_SEP);
        let size_str = subs
            .next()
            .ok_or_else(|| KeySchemeDeserializeError::BadSplitSection(split_str.to_string()))?;
        let split_str_val = subs
            .next()
            .ok_or_else(|| KeySchemeDeserializeError::BadSplitSection(split_str.to_string()))?;
        if subs.next().is_some() {
            return Err(KeySchemeDeserializeError::BadSplitSection(
                split_str.to_string(),
            ));
        }
        let size: u64 = size_str
            .parse()
            .map_err(|e: std::num::ParseIntError| {
                KeySchemeDeserializeError::BadSplitSection(e.to_string())
            })?;
        let split_size_bytes: u64 = split_str_val.parse().map_err(|e: std::num::ParseIntError| {
            KeySchemeDeserializeError::BadSplitSection(e.to_string())
        })?;
        (size, split_size_bytes)
    };

    let code_str = sections
        .next()
        .ok_or(KeySchemeDeserializeError::NoReplicationPolicySection)?;
    let mut code_subs = code_str.split(SUBSECTION_SEP);
    let code_tag = code_subs
        .next()
        .ok_or(KeySchemeDeserializeError::NoReplicationPolicySection)?;
    let (code, k, m) = match code_tag {
        "CP" => {
            let k: u32 = code_subs
                .next()
                .and_then(|v| v.parse().ok())
                .ok_or(KeySchemeDeserializeError::NoReplicationPolicySection)?;
            (CodeKind::Cp, k, 0)
        }
        "RS" => {
            let k: u32 = code_subs
                .next()
                .and_then(|v| v.parse().ok())
                .ok_or(KeySchemeDeserializeError::NoReplicationPolicySection)?;
            let m: u32 = code_subs
                .next()
                .and_then(|v| v.parse().ok())
                .ok_or(KeySchemeDeserializeError::NoReplicationPolicySection)?;
            (CodeKind::Rs, k, m)
        }
        _ => return Err(KeySchemeDeserializeError::NoReplicationPolicySection),
    };

    let ctime_str = sections
        .next()
        .ok_or(KeySchemeDeserializeError::NoCtimeSection)?;
    let ctime: u64 = ctime_str
        .parse()
        .map_err(|_| KeySchemeDeserializeError::NoCtimeSection)?;

    let rand_str = sections
        .next()
        .ok_or(KeySchemeDeserializeError::NoRandSection)?;
    let rand_tag: u32 = rand_str
        .parse()
        .map_err(|_| KeySchemeDeserializeError::NoRandSection)?;

    let locs: Vec<&str> = sections.collect();
    let chunks_count = n_chunks(size, split_size_bytes);
    let per_chunk = (k + m) as usize;
    let expected_locs = chunks_count as usize * per_chunk;
    if locs.len() != expected_locs {
        return Err(KeySchemeDeserializeError::LocationCountMismatch {
            found: locs.len(),
            expected: expected_code_spec(code, k, m),
        });
    }

    let stripe_size = match code {
        CodeKind::Cp => 0,
        CodeKind::Rs => align(split_size_bytes.div_ceil(u64::from(k)), DATA_ALIGN),
    };

    let mut layout = FragmentsLayout {
        scheme_version: version,
        service_id,
        size,
        split_size: split_size_bytes,
        n_chunks: chunks_count,
        code,
        n_data_parts: k,
        n_coding_parts: m,
        stripe_size,
        ctime,
        rand: rand_tag,
        chunks: Vec::with_capacity(chunks_count as usize),
    };

    let mut loc_iter = locs.into_iter();
    for chunk_idx in 0..chunks_count {
        let mut build = |fragment_id: u32| -> Option<FragmentLocator> {
            let uuid = loc_iter.next().unwrap_or_default();
            if uuid.is_empty() {
                None
            } else {
                Some(FragmentLocator {
                    key: layout.fragment_key(chunk_idx, fragment_id),
                    fragment_id,
                    uuid: uuid.to_string(),
                    hostname: None,
                    port: None,
                })
            }
        };
        let data = (0..k).map(&mut build).collect();
        let coding = (k..k + m).map(&mut build).collect();
        layout.chunks.push(ChunkLocators { data, coding });
    }

    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn place_all(k: u32, m: u32) -> PlacementSlots {
        PlacementSlots {
            data: (0..k).map(|i| Some(format!("data-{i}"))).collect(),
            coding: (0..m).map(|i| Some(format!("coding-{i}"))).collect(),
        }
    }

    #[test]
    fn round_trips_rs_layout() {
        let mut rng = StdRng::seed_from_u64(7);
        let layout = keygen(
            42,
            10_000,
            30_000,
            CodeKind::Rs,
            2,
            1,
            1_700_000_000_000,
            Some(0xdead_beef),
            place_all,
            &mut rng,
        );
        let raw = serialize(&layout);
        let round_tripped = deserialize(&raw, 42).expect("deserialize");
        assert_eq!(layout, round_tripped);
    }

    #[test]
    fn round_trips_cp_layout() {
        let mut rng = StdRng::seed_from_u64(3);
        let layout = keygen(
            1,
            0,
            28,
            CodeKind::Cp,
            1,
            0,
            1_700_000_000_000,
            None,
            place_all,
            &mut rng,
        );
        let raw = serialize(&layout);
        let round_tripped = deserialize(&raw, 1).expect("deserialize");
        assert_eq!(layout, round_tripped);
    }

    #[test]
    fn rejects_unknown_version() {
        let err = deserialize("9#1#10,10#CP,1#1#1#a", 1).unwrap_err();
        assert_eq!(err, KeySchemeDeserializeError::UnknownVersion("9".into()));
    }

    #[test]
    fn rejects_mismatched_service_id() {
        let mut rng = StdRng::seed_from_u64(1);
        let layout = keygen(1, 0, 28, CodeKind::Cp, 1, 0, 1, None, place_all, &mut rng);
        let raw = serialize(&layout);
        let err = deserialize(&raw, 2).unwrap_err();
        assert_eq!(err, KeySchemeDeserializeError::UnknownServiceId("1".into()));
    }

    #[test]
    fn rejects_wrong_location_count() {
        let err = deserialize("1#1#10,10#CP,2#1#1#a", 1).unwrap_err();
        assert_eq!(
            err,
            KeySchemeDeserializeError::LocationCountMismatch {
                found: 1,
                expected: "CP,2".to_string(),
            }
        );
    }

    #[test]
    fn split_size_s5_scenario() {
        let (split, stripe) = split_size(10_000, 30_000, CodeKind::Rs, 2);
        assert_eq!(split, 12_288);
        assert_eq!(stripe, align(split.div_ceil(2), DATA_ALIGN));
        assert_eq!(n_chunks(30_000, split), 3);
    }

    #[test]
    fn small_object_is_single_chunk() {
        let (split, _) = split_size(0, 28, CodeKind::Cp, 1);
        assert_eq!(n_chunks(28, split), 1);
    }
}
