#![allow(missing_docs)]

//! Read-only view of the engine handed to presentation layers.

use serde::{Deserialize, Serialize};

use crate::{geometry::BoundingBox, pool::TileId, scoring::Outcome};

/// One tile as a renderer sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileView {
    pub id: TileId,
    pub value: u32,
    pub weight: u32,
    /// Live bounds in container coordinates, if the layout places the tile.
    pub bounds: Option<BoundingBox>,
    pub spawning: bool,
    pub selected: bool,
    pub draggable: bool,
}

/// One bin as a renderer sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinView {
    pub index: usize,
    pub values: Vec<u32>,
    pub score: u32,
    /// Fill level against the per-bin goal, when the mode has one.
    pub fill_percent: Option<f32>,
}

/// Everything needed to draw a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Engine clock in milliseconds.
    pub clock_ms: u128,
    pub tiles: Vec<TileView>,
    pub selected: Vec<TileId>,
    /// Normalized rectangle of an in-progress drag.
    pub selection_box: Option<BoundingBox>,
    pub bins: Vec<BinView>,
    pub aggregate: u32,
    pub deposited: u32,
    /// Main gauge level, 0..=100.
    pub progress_percent: f32,
    pub game_over: bool,
    pub game_won: bool,
    pub outcome: Option<Outcome>,
}

impl GameSnapshot {
    pub fn tile(&self, id: TileId) -> Option<&TileView> {
        self.tiles.get(id)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Total weight of the current selection.
    pub fn selected_weight(&self) -> u32 {
        self.selected
            .iter()
            .filter_map(|id| self.tile(*id))
            .map(|tile| tile.weight)
            .sum()
    }

    /// Compact JSON rendering, used for debug logging.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
