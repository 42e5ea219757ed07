//! Pure keyed-hash interface. The concrete algorithm
//! and the process-wide seed are owned by the caller; the core only ever
//! compares `HASH_SIZE`-byte digests.

/// Fixed digest size for the stored per-block hash.
pub const HASH_SIZE: usize = 16;

/// A keyed content hash, fixed for the lifetime of the array.
///
/// Implementations are expected to be pure and reentrant.
pub trait BlockHasher {
    fn hash(&self, data: &[u8]) -> [u8; HASH_SIZE];
}

/// Constant-length compare of two digests.
pub fn digest_eq(a: &[u8; HASH_SIZE], b: &[u8; HASH_SIZE]) -> bool {
    a == b
}
