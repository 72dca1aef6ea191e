//! Fairness events handed to the notifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::proof::outcome::TileIndex;
use crate::proof::verify::VerifiedReveal;
use crate::registry::PendingBet;

/// Event with delivery metadata.
///
/// `id` is stable across retries so receivers can drop duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    /// Unique event id.
    pub id: Uuid,
    /// When the event was emitted.
    pub emitted_at: DateTime<Utc>,
    /// Payload.
    pub event: FairnessEvent,
}

impl EventEnvelope {
    /// Wrap an event with a fresh id and timestamp.
    pub fn new(event: FairnessEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            emitted_at: Utc::now(),
            event,
        }
    }
}

/// Something worth telling the outside world about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FairnessEvent {
    /// A commitment was accepted; server seed not revealed yet.
    BetPending(PendingNotice),
    /// A reveal reproduced its commitment.
    RevealVerified(RevealNotice),
}

impl FairnessEvent {
    /// Event for a freshly committed bet.
    pub fn pending(bet: &PendingBet) -> Self {
        Self::BetPending(PendingNotice {
            username: bet.username.clone(),
            nonce: bet.round.nonce,
            bet_amount: bet.bet_amount.clone(),
            currency: bet.currency.clone(),
            mines: bet.round.mines,
            client_seed: bet.round.client_seed.clone(),
            server_seed_hash: bet.round.server_seed_hash.clone(),
        })
    }

    /// Event for a verified reveal.
    pub fn verified(bet: &PendingBet, reveal: &VerifiedReveal) -> Self {
        Self::RevealVerified(RevealNotice {
            username: bet.username.clone(),
            nonce: bet.round.nonce,
            mines: bet.round.mines,
            server_seed_hash: reveal.server_seed_hash.clone(),
            mine_tiles: reveal.outcome.mine_tiles(),
            safe_tiles: reveal.outcome.safe_tiles(),
            board: reveal.outcome.to_string(),
        })
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BetPending(_) => "bet_pending",
            Self::RevealVerified(_) => "reveal_verified",
        }
    }
}

/// Summary of a pending bet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingNotice {
    /// Player name.
    pub username: String,
    /// Round nonce.
    pub nonce: u64,
    /// Stake as sent.
    pub bet_amount: String,
    /// Stake currency.
    pub currency: String,
    /// Number of mines.
    pub mines: u8,
    /// Player seed.
    pub client_seed: String,
    /// Published commitment.
    pub server_seed_hash: String,
}

/// Summary of a verified round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealNotice {
    /// Player name.
    pub username: String,
    /// Round nonce.
    pub nonce: u64,
    /// Number of mines.
    pub mines: u8,
    /// Verified commitment.
    pub server_seed_hash: String,
    /// Mine tiles, ascending.
    pub mine_tiles: Vec<TileIndex>,
    /// Safe tiles, ascending.
    pub safe_tiles: Vec<TileIndex>,
    /// 5x5 text rendering of the board.
    pub board: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proof::commitment::RoundCommitment;
    use crate::proof::verify::verify_and_reveal;

    fn create_test_bet() -> PendingBet {
        PendingBet {
            username: "alice".into(),
            round: RoundCommitment::from_server_seed("c1", 1, 3, "seedA"),
            bet_amount: "0.5".into(),
            currency: "btc".into(),
            committed_at: Utc::now(),
        }
    }

    #[test]
    fn test_pending_event_fields() {
        let bet = create_test_bet();
        match FairnessEvent::pending(&bet) {
            FairnessEvent::BetPending(notice) => {
                assert_eq!(notice.username, "alice");
                assert_eq!(notice.mines, 3);
                assert_eq!(notice.server_seed_hash, bet.round.server_seed_hash);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_verified_event_serializes_tagged() {
        let bet = create_test_bet();
        let reveal = verify_and_reveal("seedA", &bet.round).unwrap();
        let envelope = EventEnvelope::new(FairnessEvent::verified(&bet, &reveal));

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["event"]["type"], "reveal_verified");
        assert_eq!(json["event"]["mineTiles"], serde_json::json!([12, 16, 17]));
        assert_eq!(envelope.event.kind(), "reveal_verified");
    }
}
