//! Bet Registry
//!
//! Pending bets keyed by `(username, nonce)`, created on commit and
//! consumed on reveal. The reveal service only sees the [`BetStore`]
//! trait; [`InMemoryBetStore`] is the shipped backend.

pub mod memory;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FairResult;
use crate::proof::commitment::RoundCommitment;

pub use memory::InMemoryBetStore;

/// Identity of a pending bet.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BetId {
    /// Player name.
    pub username: String,
    /// Round nonce.
    pub nonce: u64,
}

impl BetId {
    /// Create a bet identity.
    pub fn new(username: impl Into<String>, nonce: u64) -> Self {
        Self {
            username: username.into(),
            nonce,
        }
    }
}

impl fmt::Display for BetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.username, self.nonce)
    }
}

/// A committed bet waiting for its server seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingBet {
    /// Player name.
    pub username: String,
    /// Public round parameters and the published seed hash.
    pub round: RoundCommitment,
    /// Stake, carried verbatim for display.
    pub bet_amount: String,
    /// Stake currency, carried verbatim for display.
    pub currency: String,
    /// When the commitment was received.
    pub committed_at: DateTime<Utc>,
}

impl PendingBet {
    /// Registry identity of this bet.
    pub fn id(&self) -> BetId {
        BetId::new(self.username.clone(), self.round.nonce)
    }
}

/// Storage for pending bets.
///
/// Implementations serialize operations on the same identity; a `put`
/// racing a reveal must never lose either write.
pub trait BetStore: Send + Sync {
    /// Insert or overwrite under `bet.id()`. Returns the bet that was
    /// replaced, if any.
    fn put(&self, bet: PendingBet) -> Option<PendingBet>;

    /// Look up a pending bet; `NotFound` if absent or expired.
    fn get(&self, id: &BetId) -> FairResult<PendingBet>;

    /// Remove a pending bet unconditionally.
    fn remove(&self, id: &BetId) -> Option<PendingBet>;

    /// Remove only if the stored bet still equals `expected`.
    ///
    /// Returns false when the bet is gone or was overwritten since it
    /// was read.
    fn remove_if_same(&self, id: &BetId, expected: &PendingBet) -> bool;

    /// Drop expired bets, returning how many were dropped.
    fn purge_expired(&self) -> usize;

    /// Number of stored bets (expired ones included until purged).
    fn len(&self) -> usize;

    /// Check if the store holds no bets.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
