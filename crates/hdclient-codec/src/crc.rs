use bytes::{BufMut, Bytes, BytesMut};

use crate::error::CodecError;

/// CRC32C footer width, in bytes.
const FOOTER_LEN: usize = 4;

/// Appends a little-endian CRC32C footer to `payload`, as stored on the
/// wire for every fragment: `payload || crc32c(payload)`.
pub fn frame(payload: &[u8]) -> Bytes {
    let crc = crc32c::crc32c(payload);
    let mut buf = BytesMut::with_capacity(payload.len() + FOOTER_LEN);
    buf.put_slice(payload);
    buf.put_u32_le(crc);
    buf.freeze()
}

/// Strips and verifies the CRC32C footer appended by [`frame`]. Returns
/// the payload alone on success.
pub fn verify(framed: &[u8], chunk_id: u64, fragment_id: u32) -> Result<Bytes, CodecError> {
    if framed.len() < FOOTER_LEN {
        return Err(CodecError::TruncatedFrame { len: framed.len() });
    }
    let (payload, footer) = framed.split_at(framed.len() - FOOTER_LEN);
    let expected_crc = u32::from_le_bytes(footer.try_into().expect("footer is exactly 4 bytes"));
    let actual_crc = crc32c::crc32c(payload);
    if actual_crc != expected_crc {
        return Err(CodecError::CorruptedData {
            chunk_id,
            fragment_id,
            expected_crc,
            actual_crc,
        });
    }
    Ok(Bytes::copy_from_slice(payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_intact_payload() {
        let framed = frame(b"hello fragment");
        let payload = verify(&framed, 0, 0).unwrap();
        assert_eq!(&payload[..], b"hello fragment");
    }

    #[test]
    fn detects_single_bit_flip() {
        let mut framed = frame(b"hello fragment").to_vec();
        framed[0] ^= 0x01;
        let err = verify(&framed, 3, 1).unwrap_err();
        assert!(matches!(
            err,
            CodecError::CorruptedData {
                chunk_id: 3,
                fragment_id: 1,
                ..
            }
        ));
    }

    #[test]
    fn rejects_short_frame() {
        let err = verify(&[0, 1], 0, 0).unwrap_err();
        assert_eq!(err, CodecError::TruncatedFrame { len: 2 });
    }
}
