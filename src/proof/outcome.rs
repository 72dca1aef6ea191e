//! Tile Outcome Derivation
//!
//! Turns `(server_seed, client_seed, nonce, mines)` into a mine/safe
//! partition of the 5x5 board:
//!
//! ```text
//! HMAC-SHA256(key = server_seed, msg = "{client_seed}:{nonce}")
//!   -> first 16 hex digits as u64
//!   -> MT19937 seed
//!   -> Fisher-Yates shuffle of [0..25)
//!   -> first `mines` entries are mines
//! ```
//!
//! Every step is fixed; changing any of them breaks verification of
//! previously published rounds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::hash::{hmac_sha256, seed_from_digest};
use crate::core::rng::DeterministicRng;
use crate::error::{FairError, FairResult};

/// Board edge length.
pub const BOARD_WIDTH: usize = 5;

/// Number of tiles on the board.
pub const BOARD_TILES: usize = BOARD_WIDTH * BOARD_WIDTH;

/// Tile position, row-major: `row * BOARD_WIDTH + col`.
pub type TileIndex = u8;

/// Inclusive range of accepted mine counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MineRange {
    min: u8,
    max: u8,
}

impl Default for MineRange {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl MineRange {
    /// At least one mine and at least one safe tile.
    pub const STANDARD: MineRange = MineRange { min: 1, max: 24 };

    /// Create a range; must satisfy `min <= max <= BOARD_TILES`.
    pub fn new(min: u8, max: u8) -> FairResult<Self> {
        if min > max {
            return Err(FairError::invalid(
                "mines",
                format!("range minimum {} exceeds maximum {}", min, max),
            ));
        }
        if max as usize > BOARD_TILES {
            return Err(FairError::invalid(
                "mines",
                format!("range maximum {} exceeds board size {}", max, BOARD_TILES),
            ));
        }
        Ok(Self { min, max })
    }

    /// Smallest accepted mine count.
    pub fn min(&self) -> u8 {
        self.min
    }

    /// Largest accepted mine count.
    pub fn max(&self) -> u8 {
        self.max
    }

    /// Check if a mine count is accepted.
    pub fn contains(&self, mines: u8) -> bool {
        mines >= self.min && mines <= self.max
    }

    /// Reject a mine count outside the range.
    pub fn check(&self, mines: u8) -> FairResult<()> {
        if self.contains(mines) {
            Ok(())
        } else {
            Err(FairError::invalid(
                "mines",
                format!("must be between {} and {}, got {}", self.min, self.max, mines),
            ))
        }
    }
}

/// Message fed to the HMAC: `"{client_seed}:{nonce}"`.
pub fn round_message(client_seed: &str, nonce: u64) -> String {
    format!("{}:{}", client_seed, nonce)
}

/// Derive the RNG seed for one round.
pub fn derive_round_seed(server_seed: &str, client_seed: &str, nonce: u64) -> u64 {
    let message = round_message(client_seed, nonce);
    let digest = hmac_sha256(server_seed.as_bytes(), message.as_bytes());
    seed_from_digest(&digest)
}

/// Derive the board for a round using the standard 1..=24 mine range.
pub fn derive_tile_outcome(
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
    mines: u8,
) -> FairResult<TileOutcome> {
    derive_tile_outcome_in(MineRange::STANDARD, server_seed, client_seed, nonce, mines)
}

/// Derive the board for a round, accepting mine counts in `range`.
pub fn derive_tile_outcome_in(
    range: MineRange,
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
    mines: u8,
) -> FairResult<TileOutcome> {
    if server_seed.is_empty() {
        return Err(FairError::invalid("serverSeed", "must not be empty"));
    }
    if client_seed.is_empty() {
        return Err(FairError::invalid("clientSeed", "must not be empty"));
    }
    range.check(mines)?;

    let seed = derive_round_seed(server_seed, client_seed, nonce);
    let mut rng = DeterministicRng::new(seed);

    let mut permutation = [0 as TileIndex; BOARD_TILES];
    for (i, tile) in permutation.iter_mut().enumerate() {
        *tile = i as TileIndex;
    }
    rng.shuffle(&mut permutation);

    Ok(TileOutcome::from_permutation(permutation, mines))
}

/// Mine/safe partition of the board.
///
/// Never persisted; recomputable by anyone holding the round inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawTileOutcome")]
pub struct TileOutcome {
    /// Shuffled tile order; the first `mine_count` entries are mines.
    permutation: [TileIndex; BOARD_TILES],
    /// Number of mines.
    mine_count: u8,
}

impl TileOutcome {
    fn from_permutation(permutation: [TileIndex; BOARD_TILES], mine_count: u8) -> Self {
        debug_assert!(mine_count as usize <= BOARD_TILES);
        Self {
            permutation,
            mine_count,
        }
    }

    /// Full shuffled order, in draw order.
    pub fn permutation(&self) -> &[TileIndex; BOARD_TILES] {
        &self.permutation
    }

    /// Number of mines.
    pub fn mine_count(&self) -> u8 {
        self.mine_count
    }

    /// Mine tiles, sorted ascending.
    pub fn mine_tiles(&self) -> Vec<TileIndex> {
        let mut tiles = self.permutation[..self.mine_count as usize].to_vec();
        tiles.sort_unstable();
        tiles
    }

    /// Safe tiles, sorted ascending.
    pub fn safe_tiles(&self) -> Vec<TileIndex> {
        let mut tiles = self.permutation[self.mine_count as usize..].to_vec();
        tiles.sort_unstable();
        tiles
    }

    /// Check if a tile holds a mine. Off-board indices are never mines.
    pub fn is_mine(&self, tile: TileIndex) -> bool {
        self.permutation[..self.mine_count as usize].contains(&tile)
    }

    /// Per-tile mine flags in board order.
    pub fn mine_mask(&self) -> [bool; BOARD_TILES] {
        let mut mask = [false; BOARD_TILES];
        for &tile in &self.permutation[..self.mine_count as usize] {
            mask[tile as usize] = true;
        }
        mask
    }
}

/// Unchecked wire form of [`TileOutcome`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTileOutcome {
    permutation: [TileIndex; BOARD_TILES],
    mine_count: u8,
}

impl TryFrom<RawTileOutcome> for TileOutcome {
    type Error = FairError;

    fn try_from(raw: RawTileOutcome) -> FairResult<Self> {
        if raw.mine_count as usize > BOARD_TILES {
            return Err(FairError::invalid(
                "mineCount",
                format!("exceeds board size {}, got {}", BOARD_TILES, raw.mine_count),
            ));
        }

        let mut seen = [false; BOARD_TILES];
        for &tile in &raw.permutation {
            let slot = seen.get_mut(tile as usize).filter(|taken| !**taken);
            match slot {
                Some(taken) => *taken = true,
                None => {
                    return Err(FairError::invalid(
                        "permutation",
                        format!("must hold each tile 0..{} once", BOARD_TILES),
                    ))
                }
            }
        }

        Ok(Self::from_permutation(raw.permutation, raw.mine_count))
    }
}

/// Renders the board as a 5x5 grid: `X` for a mine, `.` for a safe tile.
impl fmt::Display for TileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = self.mine_mask();
        for (row, cells) in mask.chunks(BOARD_WIDTH).enumerate() {
            if row > 0 {
                writeln!(f)?;
            }
            for (col, &mine) in cells.iter().enumerate() {
                if col > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", if mine { 'X' } else { '.' })?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
