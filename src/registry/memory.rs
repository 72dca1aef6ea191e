//! In-memory bet store with optional expiry.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::debug;

use super::{BetId, BetStore, PendingBet};
use crate::error::{FairError, FairResult};

struct StoredBet {
    bet: PendingBet,
    expires_at: Option<Instant>,
}

impl StoredBet {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map_or(false, |at| now >= at)
    }
}

/// Process-local bet store.
///
/// One lock around the whole map. Bets live until revealed, removed, or
/// (when a TTL is set) expired.
pub struct InMemoryBetStore {
    bets: RwLock<BTreeMap<BetId, StoredBet>>,
    ttl: Option<Duration>,
}

impl InMemoryBetStore {
    /// Create a store whose bets never expire.
    pub fn new() -> Self {
        Self::with_ttl(None)
    }

    /// Create a store with an optional time-to-live per bet.
    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            bets: RwLock::new(BTreeMap::new()),
            ttl,
        }
    }

    /// Configured time-to-live.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }
}

impl Default for InMemoryBetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BetStore for InMemoryBetStore {
    fn put(&self, bet: PendingBet) -> Option<PendingBet> {
        let expires_at = self.ttl.map(|ttl| Instant::now() + ttl);
        let mut bets = self.bets.write();
        bets.insert(bet.id(), StoredBet { bet, expires_at })
            .map(|previous| previous.bet)
    }

    fn get(&self, id: &BetId) -> FairResult<PendingBet> {
        let bets = self.bets.read();
        match bets.get(id) {
            Some(stored) if !stored.is_expired(Instant::now()) => Ok(stored.bet.clone()),
            _ => Err(FairError::NotFound {
                username: id.username.clone(),
                nonce: id.nonce,
            }),
        }
    }

    fn remove(&self, id: &BetId) -> Option<PendingBet> {
        let mut bets = self.bets.write();
        bets.remove(id).map(|stored| stored.bet)
    }

    fn remove_if_same(&self, id: &BetId, expected: &PendingBet) -> bool {
        let mut bets = self.bets.write();
        let same = bets
            .get(id)
            .map_or(false, |stored| !stored.is_expired(Instant::now()) && stored.bet == *expected);
        if same {
            bets.remove(id);
        }
        same
    }

    fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut bets = self.bets.write();
        let before = bets.len();
        bets.retain(|_, stored| !stored.is_expired(now));
        let purged = before - bets.len();
        if purged > 0 {
            debug!(purged, remaining = bets.len(), "Purged expired bets");
        }
        purged
    }

    fn len(&self) -> usize {
        self.bets.read().len()
    }
}
