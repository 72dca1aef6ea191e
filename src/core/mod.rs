//! Core deterministic primitives.
//!
//! Everything a verifier needs to recompute a round bit for bit.

pub mod hash;
pub mod rng;

// Re-export core types
pub use hash::{hmac_sha256, seed_from_digest, sha256_hex, Digest256};
pub use rng::DeterministicRng;
