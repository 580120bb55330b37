//! Tile pool: a fixed number of slots, each holding one generated tile.

use std::{ops::RangeInclusive, time::Duration};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    config::{GameConfig, ValueRange},
    error::GameError,
};

/// Stable index of a tile slot within the pool.
pub type TileId = usize;

const ORBIT_RADIUS: RangeInclusive<u32> = 5..=10;
const START_ANGLE_DEGREES: RangeInclusive<u32> = 0..=360;
const PERIOD_SECS: RangeInclusive<u64> = 6..=20;

/// Ambient orbit a tile follows around its home slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    /// Horizontal orbit radius, before layout scaling.
    pub x_radius: f32,
    /// Vertical orbit radius, before layout scaling.
    pub y_radius: f32,
    /// Angle at spawn time, in degrees.
    pub start_angle: f32,
    /// Time for one full orbit.
    pub period: Duration,
}

impl Motion {
    fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            x_radius: rng.random_range(ORBIT_RADIUS) as f32,
            y_radius: rng.random_range(ORBIT_RADIUS) as f32,
            start_angle: rng.random_range(START_ANGLE_DEGREES) as f32,
            period: Duration::from_secs(rng.random_range(PERIOD_SECS)),
        }
    }

    /// Orbit angle in radians after `elapsed` on the orbit.
    pub fn angle_at(&self, elapsed: Duration) -> f32 {
        let turns = if self.period.is_zero() {
            0.0
        } else {
            (elapsed.as_secs_f64() / self.period.as_secs_f64()).fract() as f32
        };
        (self.start_angle + turns * 360.0).to_radians()
    }
}

/// A selectable unit with a label and a scoring weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    /// Slot index.
    pub id: TileId,
    /// Label shown and deposited.
    pub value: u32,
    /// Visual weight, also the scoring contribution.
    pub weight: u32,
    /// Ambient motion parameters for this slot generation.
    pub motion: Motion,
    /// Engine clock at the last (re)spawn.
    pub spawned_at: Duration,
    /// Presentation-only "just spawned" flag.
    pub spawning: bool,
}

/// Owns exactly `pool_size` tiles for the lifetime of a round.
#[derive(Debug, Clone)]
pub struct TilePool {
    tiles: Vec<Tile>,
    values: ValueRange,
    weights: ValueRange,
    rng: ChaCha8Rng,
}

impl TilePool {
    /// Empty pool drawing from `config`'s ranges. Call [`initialize`](Self::initialize)
    /// to populate it.
    pub fn new(config: &GameConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        };
        Self {
            tiles: Vec::new(),
            values: config.values,
            weights: config.weights,
            rng,
        }
    }

    /// Replace the pool with `n` fresh tiles, all marked as spawning.
    pub fn initialize(&mut self, n: usize, now: Duration) {
        let tiles = (0..n).map(|id| self.generate(id, now)).collect();
        self.tiles = tiles;
        debug!(pool_size = n, "tile pool initialized");
    }

    /// Regenerate the given slots in place. Returns how many were respawned;
    /// identifiers outside the pool are skipped.
    pub fn respawn(&mut self, ids: impl IntoIterator<Item = TileId>, now: Duration) -> usize {
        let mut respawned = 0;
        for id in ids {
            match self.respawn_one(id, now) {
                Ok(()) => respawned += 1,
                Err(err) => warn!(%err, "skipping respawn"),
            }
        }
        respawned
    }

    /// Regenerate a single slot.
    pub fn respawn_one(&mut self, id: TileId, now: Duration) -> Result<(), GameError> {
        if id >= self.tiles.len() {
            return Err(GameError::InvalidTile {
                id,
                pool_size: self.tiles.len(),
            });
        }
        let tile = self.generate(id, now);
        self.tiles[id] = tile;
        Ok(())
    }

    /// Clear every "just spawned" flag.
    pub fn clear_spawning(&mut self) {
        for tile in &mut self.tiles {
            tile.spawning = false;
        }
    }

    /// Tiles in slot order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Tile in slot `id`, if it exists.
    pub fn get(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id)
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether the pool has no slots.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    fn generate(&mut self, id: TileId, now: Duration) -> Tile {
        Tile {
            id,
            value: self.values.sample(&mut self.rng),
            weight: self.weights.sample(&mut self.rng),
            motion: Motion::generate(&mut self.rng),
            spawned_at: now,
            spawning: true,
        }
    }
}
