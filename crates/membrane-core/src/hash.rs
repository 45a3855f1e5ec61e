//! Content checksums for membrane buffers
//!
//! Hashing is pure and synchronous, so it lives here rather than behind any
//! handler. BLAKE3 is the single algorithm used across the workspace; the
//! 32-bit checksum is the little-endian prefix of the digest.

use crate::shape::PrimeShape;

/// Full BLAKE3 digest of arbitrary bytes
#[inline]
pub fn hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Checksum over a shape and the buffer it describes
///
/// Factors are fed first (u32 LE) so that the same bytes under a different
/// axis layout produce a different checksum.
pub fn content_checksum(shape: &PrimeShape, buffer: &[f32]) -> u32 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&shape.to_le_bytes());
    for value in buffer {
        hasher.update(&value.to_bits().to_le_bytes());
    }
    let digest = hasher.finalize();
    let bytes = digest.as_bytes();
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_determinism() {
        assert_eq!(hash(b"membrane"), hash(b"membrane"));
        assert_ne!(hash(b"membrane"), hash(b"membranes"));
    }

    #[test]
    fn test_checksum_tracks_content() {
        let shape = PrimeShape::new(vec![2, 3]).unwrap();
        let zeros = vec![0.0f32; 6];
        let mut changed = zeros.clone();
        changed[4] = 1.5;

        assert_eq!(
            content_checksum(&shape, &zeros),
            content_checksum(&shape, &zeros)
        );
        assert_ne!(
            content_checksum(&shape, &zeros),
            content_checksum(&shape, &changed)
        );
    }

    #[test]
    fn test_checksum_tracks_layout() {
        let buffer = vec![1.0f32; 6];
        let a = PrimeShape::new(vec![2, 3]).unwrap();
        let b = PrimeShape::new(vec![3, 2]).unwrap();
        assert_ne!(content_checksum(&a, &buffer), content_checksum(&b, &buffer));
    }

    #[test]
    fn test_negative_zero_is_distinct_content() {
        let shape = PrimeShape::new(vec![2]).unwrap();
        assert_ne!(
            content_checksum(&shape, &[0.0, 0.0]),
            content_checksum(&shape, &[-0.0, 0.0])
        );
    }
}
