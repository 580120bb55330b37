//! Position model used for hit-testing tiles.

use std::{collections::HashMap, time::Duration};

use crate::{
    config::LayoutConfig,
    geometry::{BoundingBox, Point},
    pool::{Tile, TileId},
};

/// Source of live tile bounds in container coordinates.
pub trait TileLayout {
    /// Bounds of `tile` at engine clock `now`, or `None` if the layout does
    /// not place it.
    fn bounds(&self, tile: &Tile, now: Duration) -> Option<BoundingBox>;
}

/// Grid of home slots with every tile drifting on its own elliptical orbit.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitLayout {
    config: LayoutConfig,
}

impl OrbitLayout {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Center of slot `id` when the tile is at rest.
    pub fn home(&self, id: TileId) -> Point {
        let columns = self.config.columns.max(1);
        let col = (id % columns) as f32;
        let row = (id / columns) as f32;
        Point::new(
            (col + 0.5) * self.config.cell_width,
            (row + 0.5) * self.config.cell_height,
        )
    }

    /// Live center of `tile` at `now`.
    pub fn center(&self, tile: &Tile, now: Duration) -> Point {
        let home = self.home(tile.id);
        let angle = tile.motion.angle_at(now.saturating_sub(tile.spawned_at));
        let scale = self.config.motion_scale;
        Point::new(
            home.x + tile.motion.x_radius * scale * angle.cos(),
            home.y + tile.motion.y_radius * scale * angle.sin(),
        )
    }
}

impl TileLayout for OrbitLayout {
    fn bounds(&self, tile: &Tile, now: Duration) -> Option<BoundingBox> {
        Some(BoundingBox::centered(
            self.center(tile, now),
            self.config.tile_width,
            self.config.tile_height,
        ))
    }
}

/// Fixed table of boxes, for front ends that measure their own layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticLayout {
    boxes: HashMap<TileId, BoundingBox>,
}

impl StaticLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `id` at `bounds`, replacing any previous placement.
    pub fn place(&mut self, id: TileId, bounds: BoundingBox) -> &mut Self {
        self.boxes.insert(id, bounds);
        self
    }
}

impl FromIterator<(TileId, BoundingBox)> for StaticLayout {
    fn from_iter<I: IntoIterator<Item = (TileId, BoundingBox)>>(iter: I) -> Self {
        Self {
            boxes: iter.into_iter().collect(),
        }
    }
}

impl TileLayout for StaticLayout {
    fn bounds(&self, tile: &Tile, _now: Duration) -> Option<BoundingBox> {
        self.boxes.get(&tile.id).copied()
    }
}
