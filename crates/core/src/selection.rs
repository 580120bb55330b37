//! Rectangle-drag multi-select over the tile pool.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    geometry::{BoundingBox, Point},
    pool::TileId,
};

/// Live drag gesture, in container coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionRect {
    /// Where the pointer went down.
    pub start: Point,
    /// Latest pointer position.
    pub end: Point,
}

impl SelectionRect {
    /// Normalized hit-test box.
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_corners(self.start, self.end)
    }
}

/// Result of a pointer-down on the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStart {
    /// A new rectangle gesture began and the old selection was dropped.
    Started,
    /// The pointer went down on an already selected tile; the selection is
    /// kept so it can be dragged to a bin.
    DragExisting,
}

/// Selected tiles plus the in-progress rectangle, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionController {
    selected: BTreeSet<TileId>,
    rect: Option<SelectionRect>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a gesture at `point`. `pressed` is the tile under the pointer.
    pub fn begin(&mut self, point: Point, pressed: Option<TileId>) -> SelectionStart {
        if pressed.is_some_and(|id| self.selected.contains(&id)) {
            return SelectionStart::DragExisting;
        }
        self.selected.clear();
        self.rect = Some(SelectionRect {
            start: point,
            end: point,
        });
        SelectionStart::Started
    }

    /// Move the gesture to `point` and reselect every tile in `bounds` whose
    /// box touches the rectangle. Returns false when no gesture is active.
    pub fn update<I>(&mut self, point: Point, bounds: I) -> bool
    where
        I: IntoIterator<Item = (TileId, BoundingBox)>,
    {
        let Some(rect) = self.rect.as_mut() else {
            return false;
        };
        rect.end = point;
        let area = rect.bounding_box();
        self.selected = bounds
            .into_iter()
            .filter(|(_, tile)| tile.intersects(&area))
            .map(|(id, _)| id)
            .collect();
        true
    }

    /// Finish the gesture; the selection survives. Returns whether one was active.
    pub fn end(&mut self) -> bool {
        self.rect.take().is_some()
    }

    /// Drop the selection and any gesture.
    pub fn clear(&mut self) {
        self.selected.clear();
        self.rect = None;
    }

    /// Take the selection, leaving it empty.
    pub fn take(&mut self) -> Vec<TileId> {
        std::mem::take(&mut self.selected).into_iter().collect()
    }

    /// Selected ids in ascending order.
    pub fn selected(&self) -> impl Iterator<Item = TileId> + '_ {
        self.selected.iter().copied()
    }

    pub fn is_selected(&self, id: TileId) -> bool {
        self.selected.contains(&id)
    }

    /// Selected tiles can be dragged to a bin only between gestures.
    pub fn is_draggable(&self, id: TileId) -> bool {
        self.rect.is_none() && self.is_selected(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Whether a rectangle gesture is in progress.
    pub fn is_active(&self) -> bool {
        self.rect.is_some()
    }

    pub fn rect(&self) -> Option<SelectionRect> {
        self.rect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Vec<(TileId, BoundingBox)> {
        // 3x3 grid of 2x2 tiles spaced 4 apart
        (0..9)
            .map(|id| {
                let col = (id % 3) as f32;
                let row = (id / 3) as f32;
                (id, BoundingBox::new(col * 4.0, row * 4.0, 2.0, 2.0))
            })
            .collect()
    }

    fn selected(controller: &SelectionController) -> Vec<TileId> {
        controller.selected().collect()
    }

    #[test]
    fn drag_selects_touched_tiles() {
        let mut controller = SelectionController::new();
        assert_eq!(
            controller.begin(Point::new(1.0, 1.0), None),
            SelectionStart::Started
        );
        assert!(controller.update(Point::new(5.0, 5.0), grid()));
        assert_eq!(selected(&controller), vec![0, 1, 3, 4]);

        // shrinking the rectangle drops tiles again
        assert!(controller.update(Point::new(3.0, 3.0), grid()));
        assert_eq!(selected(&controller), vec![0]);
    }

    #[test]
    fn drag_direction_does_not_matter() {
        let mut controller = SelectionController::new();
        controller.begin(Point::new(9.0, 9.0), None);
        controller.update(Point::new(7.0, 7.0), grid());
        assert_eq!(selected(&controller), vec![8]);
    }

    #[test]
    fn touching_an_edge_selects() {
        let mut controller = SelectionController::new();
        controller.begin(Point::new(2.0, 0.0), None);
        controller.update(Point::new(4.0, 0.0), grid());
        assert_eq!(selected(&controller), vec![0, 1]);
    }

    #[test]
    fn selection_survives_release_and_allows_drag() {
        let mut controller = SelectionController::new();
        controller.begin(Point::new(0.0, 0.0), None);
        controller.update(Point::new(1.0, 1.0), grid());
        assert!(!controller.is_draggable(0));
        assert!(controller.end());
        assert!(!controller.end());
        assert!(controller.is_draggable(0));
        assert!(!controller.is_draggable(1));
        assert!(!controller.update(Point::new(10.0, 10.0), grid()));
        assert_eq!(selected(&controller), vec![0]);
    }

    #[test]
    fn pressing_a_selected_tile_keeps_the_selection() {
        let mut controller = SelectionController::new();
        controller.begin(Point::new(0.0, 0.0), None);
        controller.update(Point::new(5.0, 1.0), grid());
        controller.end();

        assert_eq!(
            controller.begin(Point::new(1.0, 1.0), Some(0)),
            SelectionStart::DragExisting
        );
        assert!(!controller.is_active());
        assert_eq!(selected(&controller), vec![0, 1]);

        // pressing an unselected tile starts over
        assert_eq!(
            controller.begin(Point::new(9.0, 1.0), Some(2)),
            SelectionStart::Started
        );
        assert!(controller.is_empty());
    }

    #[test]
    fn take_empties_the_selection() {
        let mut controller = SelectionController::new();
        controller.begin(Point::new(0.0, 0.0), None);
        controller.update(Point::new(10.0, 1.0), grid());
        controller.end();
        assert_eq!(controller.take(), vec![0, 1, 2]);
        assert!(controller.is_empty());
    }
}
