//! Content hashing using blake3.
//!
//! One digest type serves three purposes:
//! - transform cache keys (input bytes, chain configuration)
//! - output filenames (fixed-width hex digest of final bytes)
//! - claim tracking in the asset emitter

use std::fmt;

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    #[inline]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Hash a byte slice.
    #[inline]
    pub fn of(data: impl AsRef<[u8]>) -> Self {
        Self(*blake3::hash(data.as_ref()).as_bytes())
    }

    /// Get the raw bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    /// Fixed-width digest used in output filenames.
    ///
    /// `len` is clamped to the 64 hex chars blake3 provides.
    pub fn digest(self, len: usize) -> String {
        let mut hex = self.to_hex();
        hex.truncate(len.min(64));
        hex
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Display first 16 chars of hex for brevity
        write!(f, "{}", &self.to_hex()[..16])
    }
}

/// Incremental hasher for composite keys.
///
/// Each field is length-prefixed so `("ab", "c")` and `("a", "bc")`
/// produce different hashes.
#[derive(Default)]
pub struct KeyHasher(blake3::Hasher);

impl KeyHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&mut self, data: impl AsRef<[u8]>) -> &mut Self {
        let data = data.as_ref();
        self.0.update(&(data.len() as u64).to_le_bytes());
        self.0.update(data);
        self
    }

    pub fn finish(&self) -> ContentHash {
        ContentHash::new(*self.0.finalize().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_display() {
        let hash = ContentHash::new([0xab; 32]);
        assert_eq!(format!("{}", hash), "abababababababab");
    }

    #[test]
    fn test_content_hash_hex_is_full_width() {
        let hash = ContentHash::of("body { color: red }");
        assert_eq!(hash.to_hex().len(), 64);
        assert_eq!(hash.to_hex(), hex::encode(hash.0));
    }

    #[test]
    fn test_digest_is_fixed_width_prefix() {
        let hash = ContentHash::of(b"export default 1;");
        let short = hash.digest(20);
        assert_eq!(short.len(), 20);
        assert!(hash.to_hex().starts_with(&short));
        assert_eq!(hash.digest(500).len(), 64);
    }

    #[test]
    fn test_hash_depends_only_on_bytes() {
        let a = ContentHash::of(b"same bytes".to_vec());
        let b = ContentHash::of("same bytes");
        assert_eq!(a, b);
        assert_ne!(a, ContentHash::of("other bytes"));
    }

    #[test]
    fn test_key_hasher_field_boundaries() {
        let ab_c = KeyHasher::new().field("ab").field("c").finish();
        let a_bc = KeyHasher::new().field("a").field("bc").finish();
        assert_ne!(ab_c, a_bc);
    }
}
