//! # Mines Fair
//!
//! Provably fair verification for 5x5 mine-field rounds.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        MINES FAIR                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - MT19937 with reference seeding            │
//! │  └── hash.rs     - SHA-256 / HMAC-SHA256 helpers             │
//! │                                                              │
//! │  proof/          - Fairness engine (pure)                    │
//! │  ├── commitment.rs - Server seed commitment                  │
//! │  ├── outcome.rs  - Mine/safe partition derivation            │
//! │  └── verify.rs   - Reveal verification                       │
//! │                                                              │
//! │  registry/       - Pending bets by (username, nonce)         │
//! │  protocol.rs     - Commit/reveal payloads and responses      │
//! │  service.rs      - Commit/reveal orchestration               │
//! │  notify/         - Events, sinks, retrying dispatcher        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! `core/` and `proof/` are pure: no clocks, no I/O, no global state.
//! Given the same `(server_seed, client_seed, nonce, mines)` every
//! platform derives the same board, and so does any independent verifier
//! implementing the documented derivation.
//!
//! ```
//! use mines_fair::{compute_commitment_hash, derive_tile_outcome};
//!
//! let hash = compute_commitment_hash("seedA");
//! let board = derive_tile_outcome("seedA", "c1", 1, 3).unwrap();
//! assert_eq!(board.mine_tiles(), vec![12, 16, 17]);
//! assert_eq!(hash.len(), 64);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod error;
pub mod notify;
pub mod proof;
pub mod protocol;
pub mod registry;
pub mod service;

// Re-export commonly used types
pub use config::{ConfigError, FairnessConfig};
pub use error::{ErrorCode, FairError, FairResult};
pub use proof::{
    compute_commitment_hash, derive_tile_outcome, verify_and_reveal, MineRange, RoundCommitment,
    TileOutcome, VerifiedReveal, BOARD_TILES, BOARD_WIDTH,
};
pub use registry::{BetId, BetStore, InMemoryBetStore, PendingBet};
pub use service::RevealService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
