//! Protocol Messages
//!
//! Commit and reveal payloads as they arrive from the game client, and the
//! structured responses sent back. JSON field names are camelCase.
//! Validation happens once, here, before anything reaches the registry or
//! the engine.

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ErrorCode, FairError, FairResult};
use crate::proof::commitment::RoundCommitment;
use crate::proof::outcome::{MineRange, TileIndex};
use crate::proof::verify::VerifiedReveal;
use crate::registry::{BetId, PendingBet};

// =============================================================================
// CLIENT -> SERVICE MESSAGES
// =============================================================================

/// Commitment for an upcoming round.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    /// Player name (identity component).
    pub username: String,
    /// Round nonce (identity component).
    pub nonce: u64,
    /// Player-chosen seed.
    pub client_seed: String,
    /// Published SHA-256 of the server seed.
    pub server_seed_hash: String,
    /// Number of mines. Wider than a board can hold so that out-of-range
    /// values reach `validate` instead of failing to parse.
    pub mines: i64,
    /// Stake, display only. Accepts a JSON string or number.
    #[serde(default, deserialize_with = "string_or_number")]
    pub bet_amount: String,
    /// Stake currency, display only.
    #[serde(default)]
    pub currency: String,
}

impl CommitRequest {
    /// Validate fields and build the pending bet.
    ///
    /// `username` and `clientSeed` are kept byte for byte; the client seed
    /// feeds the round HMAC, so any rewriting would change the board.
    pub fn validate(&self, range: MineRange) -> FairResult<PendingBet> {
        require_non_empty("username", &self.username)?;
        require_non_empty("clientSeed", &self.client_seed)?;
        let mines = u8::try_from(self.mines).map_err(|_| {
            FairError::invalid(
                "mines",
                format!("must be between {} and {}, got {}", range.min(), range.max(), self.mines),
            )
        })?;
        range.check(mines)?;
        let round = RoundCommitment::new(
            self.client_seed.clone(),
            self.nonce,
            mines,
            &self.server_seed_hash,
        )?;

        Ok(PendingBet {
            username: self.username.clone(),
            round,
            bet_amount: self.bet_amount.clone(),
            currency: self.currency.clone(),
            committed_at: Utc::now(),
        })
    }
}

/// Seed reveal for a committed round.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealRequest {
    /// Player name.
    pub username: String,
    /// Round nonce.
    pub nonce: u64,
    /// The now-public server seed.
    pub server_seed: String,
}

impl RevealRequest {
    /// Validate fields and resolve the registry identity.
    pub fn validate(&self) -> FairResult<BetId> {
        require_non_empty("username", &self.username)?;
        if self.server_seed.is_empty() {
            return Err(FairError::invalid("serverSeed", "must not be empty"));
        }
        Ok(BetId::new(self.username.clone(), self.nonce))
    }
}

/// Reject empty and whitespace-only values.
fn require_non_empty(field: &'static str, value: &str) -> FairResult<()> {
    if value.trim().is_empty() {
        Err(FairError::invalid(field, "must not be empty"))
    } else {
        Ok(())
    }
}

/// Accept `"0.5"` or `0.5` and keep the text as sent.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Amount::deserialize(deserializer)? {
        Amount::Text(text) => text,
        Amount::Number(number) => number.to_string(),
    })
}

// =============================================================================
// SERVICE -> CLIENT MESSAGES
// =============================================================================

/// Answer to a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    /// Whether the bet is now pending.
    pub ok: bool,
    /// Rejection code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorCode>,
    /// Rejection detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CommitResponse {
    /// Build the response for a commit result.
    pub fn from_result<T>(result: &FairResult<T>) -> Self {
        match result {
            Ok(_) => Self {
                ok: true,
                error: None,
                message: None,
            },
            Err(err) => Self {
                ok: false,
                error: Some(err.code()),
                message: Some(err.to_string()),
            },
        }
    }
}

/// Answer to a reveal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealResponse {
    /// Whether the seed reproduced the commitment.
    pub verified: bool,
    /// Recomputed commitment (verified only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_seed_hash: Option<String>,
    /// Mine tiles, ascending (verified only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mine_tiles: Option<Vec<TileIndex>>,
    /// Safe tiles, ascending (verified only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe_tiles: Option<Vec<TileIndex>>,
    /// Rejection code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorCode>,
    /// Rejection detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RevealResponse {
    /// Build the response for a reveal result.
    pub fn from_result(result: &FairResult<VerifiedReveal>) -> Self {
        match result {
            Ok(reveal) => Self {
                verified: true,
                server_seed_hash: Some(reveal.server_seed_hash.clone()),
                mine_tiles: Some(reveal.outcome.mine_tiles()),
                safe_tiles: Some(reveal.outcome.safe_tiles()),
                error: None,
                message: None,
            },
            Err(err) => Self {
                verified: false,
                server_seed_hash: None,
                mine_tiles: None,
                safe_tiles: None,
                error: Some(err.code()),
                message: Some(err.to_string()),
            },
        }
    }
}
