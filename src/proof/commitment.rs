//! Server Seed Commitment Protocol
//!
//! The house publishes `SHA-256(server_seed)` before a round is played and
//! reveals the seed afterwards. Any change to the seed after publication
//! changes the hash and is caught at verification.

use serde::{Deserialize, Serialize};

use crate::core::hash::{is_digest_hex, sha256_hex};
use crate::error::{FairError, FairResult};

/// Compute the public commitment for a server seed.
///
/// Lowercase hex SHA-256 of the seed's UTF-8 bytes, with no domain
/// separator so that off-the-shelf verifiers agree with it.
pub fn compute_commitment_hash(server_seed: &str) -> String {
    sha256_hex(server_seed.as_bytes())
}

/// Public parameters of one committed round.
///
/// Everything here is known to the player before the reveal. Cannot be
/// changed after the commitment is published.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundCommitment {
    /// Player-chosen seed.
    pub client_seed: String,

    /// Round counter for this player.
    pub nonce: u64,

    /// Number of mines on the board.
    pub mines: u8,

    /// Published hash of the server seed (lowercase hex).
    pub server_seed_hash: String,
}

impl RoundCommitment {
    /// Create a commitment from a published hash.
    ///
    /// The hash must be 64 hex digits; it is stored lowercase.
    pub fn new(
        client_seed: impl Into<String>,
        nonce: u64,
        mines: u8,
        server_seed_hash: &str,
    ) -> FairResult<Self> {
        let server_seed_hash = normalize_commitment_hash(server_seed_hash)?;
        Ok(Self {
            client_seed: client_seed.into(),
            nonce,
            mines,
            server_seed_hash,
        })
    }

    /// Create a commitment directly from the secret seed (house side).
    pub fn from_server_seed(
        client_seed: impl Into<String>,
        nonce: u64,
        mines: u8,
        server_seed: &str,
    ) -> Self {
        Self {
            client_seed: client_seed.into(),
            nonce,
            mines,
            server_seed_hash: compute_commitment_hash(server_seed),
        }
    }

    /// Verify that a revealed seed matches this commitment.
    pub fn verify(&self, server_seed: &str) -> bool {
        compute_commitment_hash(server_seed) == self.server_seed_hash
    }
}

/// Validate a published commitment hash and fold it to lowercase.
pub fn normalize_commitment_hash(hash: &str) -> FairResult<String> {
    let trimmed = hash.trim();
    if trimmed.is_empty() {
        return Err(FairError::invalid("serverSeedHash", "must not be empty"));
    }
    if !is_digest_hex(trimmed) {
        return Err(FairError::invalid(
            "serverSeedHash",
            format!("expected 64 hex digits, got {:?}", trimmed),
        ));
    }
    Ok(trimmed.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_commitment() -> RoundCommitment {
        RoundCommitment::from_server_seed("c1", 1, 3, "seedA")
    }

    #[test]
    fn test_commitment_creation() {
        let commitment = create_test_commitment();

        assert!(commitment.verify("seedA"));
        assert_eq!(
            commitment.server_seed_hash,
            "93f54b7b9570156abb3b9860c7236cb7223f073f3eae76f8c65a912ee8aed333"
        );
    }

    #[test]
    fn test_commitment_determinism() {
        assert_eq!(compute_commitment_hash("seedA"), compute_commitment_hash("seedA"));
    }

    #[test]
    fn test_commitment_binding_samples() {
        let pairs = [
            ("seedA", "seedB"),
            ("seedA", "seeda"),
            ("seedA", "seedA "),
            ("", " "),
            ("house-secret", "house-secret\n"),
        ];
        for (a, b) in pairs {
            assert_ne!(compute_commitment_hash(a), compute_commitment_hash(b), "{:?} vs {:?}", a, b);
        }
        assert_eq!(
            compute_commitment_hash("seedB"),
            "eef9a9bedb754aadd02ae4ff6db202b2dbde895afc66d9528e7eed9ec10f264d"
        );
    }

    #[test]
    fn test_wrong_seed_fails() {
        let commitment = create_test_commitment();
        assert!(!commitment.verify("seedB"));
    }

    #[test]
    fn test_published_hash_is_normalized() {
        let upper = compute_commitment_hash("seedA").to_uppercase();
        let commitment = RoundCommitment::new("c1", 1, 3, &upper).unwrap();
        assert!(commitment.verify("seedA"));
    }

    #[test]
    fn test_malformed_hash_rejected() {
        let not_hex = "z".repeat(64);
        for bad in ["", "   ", "abc", not_hex.as_str()] {
            let result = RoundCommitment::new("c1", 1, 3, bad);
            assert!(
                matches!(result, Err(FairError::InvalidParameter { field: "serverSeedHash", .. })),
                "{:?}",
                bad
            );
        }
    }
}
