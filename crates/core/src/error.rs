//! Error types raised by the engine and the configuration layer.

use thiserror::Error;

use crate::pool::TileId;

/// Rejections reported by [`SelectionGame`](crate::SelectionGame) mutators.
///
/// None of these leave the engine in a modified state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The requested bin does not exist in this round.
    #[error("bin {bin} does not exist (round has {bins} bins)")]
    UnknownBin {
        /// Requested bin index.
        bin: usize,
        /// Number of bins configured for the round.
        bins: usize,
    },
    /// The round already reached a terminal outcome.
    #[error("round is over; reset to start a new sequence")]
    RoundOver,
    /// A tile identifier outside the pool was referenced.
    #[error("tile {id} is outside the pool of {pool_size}")]
    InvalidTile {
        /// Offending identifier.
        id: TileId,
        /// Current pool size.
        pool_size: usize,
    },
}

/// Validation failures for [`GameConfig`](crate::config::GameConfig) and friends.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("pool size must be at least 1")]
    EmptyPool,
    #[error("{name} range {min}..={max} is empty")]
    EmptyRange {
        name: &'static str,
        min: u32,
        max: u32,
    },
    #[error("at least one bin is required")]
    NoBins,
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("target percentage {0} must be within 1..=100")]
    TargetOutOfRange(u32),
    #[error("{name} must be a positive finite number (got {value})")]
    NonPositive { name: &'static str, value: f32 },
}
