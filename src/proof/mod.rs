//! Fairness Engine
//!
//! Pure, stateless functions; safe to call from any thread.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    FAIRNESS ENGINE                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  commitment.rs   - SHA-256 server seed commitment           │
//! │  outcome.rs      - HMAC-seeded shuffle into mines/safe      │
//! │  verify.rs       - Reveal check, fail closed on mismatch    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod commitment;
pub mod outcome;
pub mod verify;

// Re-export key types
pub use commitment::{compute_commitment_hash, normalize_commitment_hash, RoundCommitment};
pub use outcome::{
    derive_round_seed, derive_tile_outcome, derive_tile_outcome_in, MineRange, TileIndex,
    TileOutcome, BOARD_TILES, BOARD_WIDTH,
};
pub use verify::{verify_and_reveal, verify_and_reveal_in, VerificationReport, VerifiedReveal};
