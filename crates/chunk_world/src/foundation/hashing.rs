//! Content hashing for deduplication
//!
//! Hashes are SHA-256 digests rendered as lowercase hex, so they are stable
//! across runs, platforms and compiler versions and can be used as record keys.

use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Hash arbitrary bytes into a hex string
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable_and_content_addressed() {
        let a = content_hash(b"tree|oak");
        let b = content_hash(b"tree|oak");
        let c = content_hash(b"tree|elm");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }
}
