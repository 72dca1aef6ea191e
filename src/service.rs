//! Reveal Service
//!
//! Commit and reveal handling on top of the registry and the engine.
//! No network I/O happens here: results go back to the caller and events
//! go to an [`EventSink`], strictly after the registry write or the
//! successful verification they describe.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::config::FairnessConfig;
use crate::error::{FairError, FairResult};
use crate::notify::{EventEnvelope, EventSink, FairnessEvent};
use crate::proof::outcome::MineRange;
use crate::proof::verify::{verify_and_reveal_in, VerifiedReveal};
use crate::protocol::{CommitRequest, CommitResponse, RevealRequest, RevealResponse};
use crate::registry::{BetId, BetStore};

/// Commit/reveal orchestration.
#[derive(Clone)]
pub struct RevealService {
    store: Arc<dyn BetStore>,
    sink: Arc<dyn EventSink>,
    mine_range: MineRange,
}

impl RevealService {
    /// Create a service over a bet store and an event sink.
    pub fn new(store: Arc<dyn BetStore>, sink: Arc<dyn EventSink>, config: &FairnessConfig) -> Self {
        Self {
            store,
            sink,
            mine_range: config.mine_range,
        }
    }

    /// Accepted mine counts.
    pub fn mine_range(&self) -> MineRange {
        self.mine_range
    }

    /// Store a commitment as a pending bet.
    ///
    /// An existing bet with the same `(username, nonce)` is replaced.
    #[instrument(skip(self, request), fields(username = %request.username, nonce = request.nonce))]
    pub fn commit(&self, request: &CommitRequest) -> FairResult<BetId> {
        let bet = request.validate(self.mine_range).map_err(|err| {
            warn!(%err, "Rejected commit");
            err
        })?;
        let id = bet.id();

        if let Some(previous) = self.store.put(bet.clone()) {
            warn!(
                bet = %id,
                previous_hash = %previous.round.server_seed_hash,
                "Overwrote pending bet"
            );
        }
        info!(
            bet = %id,
            mines = bet.round.mines,
            server_seed_hash = %bet.round.server_seed_hash,
            "Bet pending"
        );

        self.sink.emit(EventEnvelope::new(FairnessEvent::pending(&bet)));
        Ok(id)
    }

    /// Verify a revealed seed and consume the pending bet.
    ///
    /// On `HashMismatch` the bet stays pending and no outcome is produced.
    /// A bet consumed or replaced while this reveal was verifying reads as
    /// `NotFound`.
    #[instrument(skip(self, request), fields(username = %request.username, nonce = request.nonce))]
    pub fn reveal(&self, request: &RevealRequest) -> FairResult<VerifiedReveal> {
        let result = self.try_reveal(request);
        if let Err(err) = &result {
            warn!(%err, code = ?err.code(), "Rejected reveal");
        }
        result
    }

    fn try_reveal(&self, request: &RevealRequest) -> FairResult<VerifiedReveal> {
        let id = request.validate()?;
        let bet = self.store.get(&id)?;

        let reveal = verify_and_reveal_in(self.mine_range, &request.server_seed, &bet.round)?;

        if !self.store.remove_if_same(&id, &bet) {
            return Err(FairError::NotFound {
                username: id.username,
                nonce: id.nonce,
            });
        }

        info!(
            bet = %id,
            mine_tiles = ?reveal.outcome.mine_tiles(),
            "Reveal verified"
        );
        self.sink
            .emit(EventEnvelope::new(FairnessEvent::verified(&bet, &reveal)));
        Ok(reveal)
    }

    /// Commit and wrap the result for the wire.
    pub fn handle_commit(&self, request: &CommitRequest) -> CommitResponse {
        CommitResponse::from_result(&self.commit(request))
    }

    /// Reveal and wrap the result for the wire.
    pub fn handle_reveal(&self, request: &RevealRequest) -> RevealResponse {
        RevealResponse::from_result(&self.reveal(request))
    }

    /// Number of bets awaiting reveal.
    pub fn pending_count(&self) -> usize {
        self.store.len()
    }

    /// Drop expired pending bets.
    pub fn purge_expired(&self) -> usize {
        self.store.purge_expired()
    }
}

/// Periodically purge expired bets from `store`.
pub fn spawn_expiry_task(store: Arc<dyn BetStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let purged = store.purge_expired();
            if purged > 0 {
                debug!(purged, "Expiry sweep");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{ChannelSink, TracingSink};
    use crate::proof::commitment::compute_commitment_hash;
    use crate::proof::outcome::derive_tile_outcome;
    use crate::registry::InMemoryBetStore;
    use parking_lot::Mutex;

    /// Sink that records everything it is given.
    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<FairnessEvent>>,
    }

    impl EventSink for RecordingSink {
        fn emit(&self, envelope: EventEnvelope) {
            self.events.lock().push(envelope.event);
        }
    }

    fn create_test_service() -> (RevealService, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let service = RevealService::new(
            Arc::new(InMemoryBetStore::new()),
            sink.clone(),
            &FairnessConfig::default(),
        );
        (service, sink)
    }

    fn commit_request(username: &str, nonce: u64, seed: &str, mines: u8) -> CommitRequest {
        CommitRequest {
            username: username.into(),
            nonce,
            client_seed: "c1".into(),
            server_seed_hash: compute_commitment_hash(seed),
            mines: mines.into(),
            bet_amount: "0.5".into(),
            currency: "btc".into(),
        }
    }

    fn reveal_request(username: &str, nonce: u64, seed: &str) -> RevealRequest {
        RevealRequest {
            username: username.into(),
            nonce,
            server_seed: seed.into(),
        }
    }

    #[test]
    fn test_commit_then_reveal() {
        let (service, sink) = create_test_service();

        let id = service.commit(&commit_request("alice", 1, "seedA", 3)).unwrap();
        assert_eq!(id, BetId::new("alice", 1));
        assert_eq!(service.pending_count(), 1);

        let reveal = service.reveal(&reveal_request("alice", 1, "seedA")).unwrap();
        assert_eq!(reveal.outcome.mine_tiles(), vec![12, 16, 17]);
        assert_eq!(service.pending_count(), 0);

        let events = sink.events.lock();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], FairnessEvent::BetPending(_)));
        assert!(matches!(events[1], FairnessEvent::RevealVerified(_)));
    }

    #[test]
    fn test_wrong_seed_keeps_bet_pending() {
        let (service, sink) = create_test_service();
        service.commit(&commit_request("alice", 1, "seedA", 3)).unwrap();

        let result = service.reveal(&reveal_request("alice", 1, "seedB"));
        assert!(matches!(result, Err(FairError::HashMismatch { .. })));
        assert_eq!(service.pending_count(), 1);

        // No reveal event on mismatch
        assert_eq!(sink.events.lock().len(), 1);

        // The right seed still works afterwards
        assert!(service.reveal(&reveal_request("alice", 1, "seedA")).is_ok());
    }

    #[test]
    fn test_padded_client_seed_matches_independent_derivation() {
        let (service, _) = create_test_service();
        let mut request = commit_request("alice", 1, "seedA", 3);
        request.client_seed = " c1 ".into();
        service.commit(&request).unwrap();

        let reveal = service.reveal(&reveal_request("alice", 1, "seedA")).unwrap();
        let independent = derive_tile_outcome("seedA", " c1 ", 1, 3).unwrap();
        assert_eq!(reveal.outcome, independent);
        assert_eq!(reveal.outcome.mine_tiles(), vec![8, 17, 22]);
    }

    #[test]
    fn test_reveal_without_commit() {
        let (service, _) = create_test_service();
        let result = service.reveal(&reveal_request("bob", 7, "seedA"));
        assert_eq!(
            result,
            Err(FairError::NotFound { username: "bob".into(), nonce: 7 })
        );
    }

    #[test]
    fn test_double_reveal_is_not_found() {
        let (service, _) = create_test_service();
        service.commit(&commit_request("alice", 1, "seedA", 3)).unwrap();

        assert!(service.reveal(&reveal_request("alice", 1, "seedA")).is_ok());
        assert!(matches!(
            service.reveal(&reveal_request("alice", 1, "seedA")),
            Err(FairError::NotFound { .. })
        ));
    }

    #[test]
    fn test_invalid_commit_never_stored() {
        let (service, sink) = create_test_service();
        let result = service.commit(&commit_request("alice", 1, "seedA", 25));

        assert!(matches!(result, Err(FairError::InvalidParameter { field: "mines", .. })));
        assert_eq!(service.pending_count(), 0);
        assert!(sink.events.lock().is_empty());
    }

    #[test]
    fn test_recommit_overwrites() {
        let (service, _) = create_test_service();
        service.commit(&commit_request("alice", 1, "seedA", 3)).unwrap();
        service.commit(&commit_request("alice", 1, "seedB", 3)).unwrap();

        assert_eq!(service.pending_count(), 1);
        assert!(matches!(
            service.reveal(&reveal_request("alice", 1, "seedA")),
            Err(FairError::HashMismatch { .. })
        ));
        assert!(service.reveal(&reveal_request("alice", 1, "seedB")).is_ok());
    }

    #[test]
    fn test_wire_responses() {
        let (service, _) = create_test_service();
        assert!(service.handle_commit(&commit_request("alice", 1, "seedA", 3)).ok);

        let response = service.handle_reveal(&reveal_request("alice", 1, "seedA"));
        assert!(response.verified);
        assert_eq!(response.mine_tiles, Some(vec![12, 16, 17]));

        let response = service.handle_reveal(&reveal_request("alice", 1, "seedA"));
        assert!(!response.verified);
        assert_eq!(response.error, Some(crate::error::ErrorCode::NotFound));
    }

    #[test]
    fn test_tracing_sink_service() {
        let service = RevealService::new(
            Arc::new(InMemoryBetStore::new()),
            Arc::new(TracingSink),
            &FairnessConfig::default(),
        );
        service.commit(&commit_request("alice", 1, "seedA", 3)).unwrap();
        assert!(service.reveal(&reveal_request("alice", 1, "seedA")).is_ok());
    }

    #[tokio::test]
    async fn test_channel_sink_receives_events() {
        let (sink, mut rx) = ChannelSink::channel(8);
        let service = RevealService::new(
            Arc::new(InMemoryBetStore::new()),
            Arc::new(sink),
            &FairnessConfig::default(),
        );

        service.commit(&commit_request("alice", 1, "seedA", 3)).unwrap();
        service.reveal(&reveal_request("alice", 1, "seedA")).unwrap();

        assert_eq!(rx.recv().await.unwrap().event.kind(), "bet_pending");
        assert_eq!(rx.recv().await.unwrap().event.kind(), "reveal_verified");
    }

    #[tokio::test]
    async fn test_expiry_task_purges() {
        let store: Arc<dyn BetStore> = Arc::new(InMemoryBetStore::with_ttl(Some(Duration::ZERO)));
        let service = RevealService::new(store.clone(), Arc::new(TracingSink), &FairnessConfig::default());
        service.commit(&commit_request("alice", 1, "seedA", 3)).unwrap();

        let handle = spawn_expiry_task(store.clone(), Duration::from_millis(5));
        for _ in 0..100 {
            if store.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        handle.abort();

        assert!(store.is_empty());
        assert!(matches!(
            service.reveal(&reveal_request("alice", 1, "seedA")),
            Err(FairError::NotFound { .. })
        ));
    }
}
