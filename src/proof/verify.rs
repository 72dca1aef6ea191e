//! Reveal Verification
//!
//! Checks a revealed server seed against the published commitment and,
//! only when it matches, derives the board. A mismatch never yields an
//! outcome, partial or otherwise.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, FairError, FairResult};
use crate::proof::commitment::{compute_commitment_hash, RoundCommitment};
use crate::proof::outcome::{derive_tile_outcome_in, MineRange, TileOutcome};

/// A reveal that reproduced its commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedReveal {
    /// Hash recomputed from the revealed seed (equals the commitment).
    pub server_seed_hash: String,
    /// Verified board.
    pub outcome: TileOutcome,
}

/// Verify a revealed seed against a commitment, standard mine range.
pub fn verify_and_reveal(
    server_seed: &str,
    commitment: &RoundCommitment,
) -> FairResult<VerifiedReveal> {
    verify_and_reveal_in(MineRange::STANDARD, server_seed, commitment)
}

/// Verify a revealed seed against a commitment.
///
/// 1. Recompute `SHA-256(server_seed)`
/// 2. Compare to the committed hash, fail closed with `HashMismatch`
/// 3. Derive the board from the committed round parameters
pub fn verify_and_reveal_in(
    range: MineRange,
    server_seed: &str,
    commitment: &RoundCommitment,
) -> FairResult<VerifiedReveal> {
    if server_seed.is_empty() {
        return Err(FairError::invalid("serverSeed", "must not be empty"));
    }

    let computed = compute_commitment_hash(server_seed);
    if !computed.eq_ignore_ascii_case(&commitment.server_seed_hash) {
        return Err(FairError::HashMismatch {
            expected: commitment.server_seed_hash.clone(),
            computed,
        });
    }

    let outcome = derive_tile_outcome_in(
        range,
        server_seed,
        &commitment.client_seed,
        commitment.nonce,
        commitment.mines,
    )?;

    Ok(VerifiedReveal {
        server_seed_hash: computed,
        outcome,
    })
}

/// Flat view of a verification attempt.
///
/// `outcome` is `Some` only when `verified` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    /// Whether the seed reproduced the commitment and the board was derived.
    pub verified: bool,
    /// Verified board.
    pub outcome: Option<TileOutcome>,
    /// Hash of the revealed seed, whatever the result.
    pub recomputed_hash: String,
    /// Why verification failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorCode>,
}

impl VerificationReport {
    /// Run verification and flatten the result.
    pub fn run(range: MineRange, server_seed: &str, commitment: &RoundCommitment) -> Self {
        match verify_and_reveal_in(range, server_seed, commitment) {
            Ok(reveal) => Self {
                verified: true,
                outcome: Some(reveal.outcome),
                recomputed_hash: reveal.server_seed_hash,
                error: None,
            },
            Err(err) => Self {
                verified: false,
                outcome: None,
                recomputed_hash: compute_commitment_hash(server_seed),
                error: Some(err.code()),
            },
        }
    }
}
