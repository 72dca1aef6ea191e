//! Hashing Primitives
//!
//! SHA-256 and HMAC-SHA256 helpers for:
//! - Server seed commitments
//! - Round seed derivation from the revealed server seed
//!
//! Digests are exchanged as lowercase hex, which is the form players
//! see and paste into independent verifiers.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

/// Hash output type (256 bits / 32 bytes)
pub type Digest256 = [u8; 32];

/// Length of a hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Number of leading hex digits of the HMAC digest used as round seed.
pub const SEED_PREFIX_HEX_DIGITS: usize = 16;

type HmacSha256 = Hmac<Sha256>;

/// Compute SHA-256 of arbitrary data.
pub fn sha256(data: &[u8]) -> Digest256 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute SHA-256 of arbitrary data as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Compute HMAC-SHA256 of `message` under `key`.
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> Digest256 {
    // HMAC accepts keys of any length
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key)
        .unwrap_or_else(|_| unreachable!("HMAC takes keys of any size"));
    mac.update(message);
    mac.finalize().into_bytes().into()
}

/// Compute HMAC-SHA256 of `message` under `key` as lowercase hex.
pub fn hmac_sha256_hex(key: &[u8], message: &[u8]) -> String {
    hex::encode(hmac_sha256(key, message))
}

/// Read the first [`SEED_PREFIX_HEX_DIGITS`] hex digits of a digest as a
/// big-endian integer.
///
/// 16 hex digits are exactly the first 8 bytes of the raw digest.
#[inline]
pub fn seed_from_digest(digest: &Digest256) -> u64 {
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..SEED_PREFIX_HEX_DIGITS / 2]);
    u64::from_be_bytes(prefix)
}

/// Check that a string is a well-formed hex SHA-256 digest (either case).
pub fn is_digest_hex(value: &str) -> bool {
    value.len() == DIGEST_HEX_LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            sha256_hex(b"seedA"),
            "93f54b7b9570156abb3b9860c7236cb7223f073f3eae76f8c65a912ee8aed333"
        );
    }

    #[test]
    fn test_hmac_known_vector() {
        assert_eq!(
            hmac_sha256_hex(b"key", b"The quick brown fox jumps over the lazy dog"),
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn test_hmac_key_matters() {
        let a = hmac_sha256(b"key-a", b"c1:1");
        let b = hmac_sha256(b"key-b", b"c1:1");
        assert_ne!(a, b);
    }

    #[test]
    fn test_seed_from_digest() {
        let digest = hmac_sha256(b"seedA", b"c1:1");
        assert_eq!(
            hex::encode(digest),
            "37c3926f9109264d2bff311f3e70c3737cf392f2c2b3be5234cf1cfa8f13b31d"
        );
        assert_eq!(seed_from_digest(&digest), 0x37c3_926f_9109_264d);
        assert_eq!(seed_from_digest(&digest), 4018216300416935501);
    }

    #[test]
    fn test_is_digest_hex() {
        assert!(is_digest_hex(&sha256_hex(b"x")));
        assert!(is_digest_hex(&sha256_hex(b"x").to_uppercase()));
        assert!(!is_digest_hex("abc"));
        assert!(!is_digest_hex(&"g".repeat(64)));
    }
}
