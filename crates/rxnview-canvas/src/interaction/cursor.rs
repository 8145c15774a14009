//! Cursor hints and the eight resize squares around a selected rectangle.

use rxnview_core::{Bounds, Point};
use serde::{Deserialize, Serialize};

/// Cursor shape the host should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CursorHint {
    #[default]
    Default,
    Move,
    Grab,
    Grabbing,
    Crosshair,
    Pointer,
    ResizeNwse,
    ResizeNesw,
    ResizeNs,
    ResizeEw,
}

/// One of the resize squares drawn on the outline of a selected element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResizeHandle {
    NorthWest,
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::NorthWest,
        ResizeHandle::North,
        ResizeHandle::NorthEast,
        ResizeHandle::East,
        ResizeHandle::SouthEast,
        ResizeHandle::South,
        ResizeHandle::SouthWest,
        ResizeHandle::West,
    ];

    pub fn cursor(self) -> CursorHint {
        match self {
            ResizeHandle::NorthWest | ResizeHandle::SouthEast => CursorHint::ResizeNwse,
            ResizeHandle::NorthEast | ResizeHandle::SouthWest => CursorHint::ResizeNesw,
            ResizeHandle::North | ResizeHandle::South => CursorHint::ResizeNs,
            ResizeHandle::East | ResizeHandle::West => CursorHint::ResizeEw,
        }
    }

    fn moves_left(self) -> bool {
        matches!(
            self,
            ResizeHandle::NorthWest | ResizeHandle::West | ResizeHandle::SouthWest
        )
    }

    fn moves_right(self) -> bool {
        matches!(
            self,
            ResizeHandle::NorthEast | ResizeHandle::East | ResizeHandle::SouthEast
        )
    }

    fn moves_top(self) -> bool {
        matches!(
            self,
            ResizeHandle::NorthWest | ResizeHandle::North | ResizeHandle::NorthEast
        )
    }

    fn moves_bottom(self) -> bool {
        matches!(
            self,
            ResizeHandle::SouthWest | ResizeHandle::South | ResizeHandle::SouthEast
        )
    }

    /// Where this square sits on `rect`.
    pub fn anchor(self, rect: &Bounds) -> Point {
        let c = rect.center();
        let x = if self.moves_left() {
            rect.min_x
        } else if self.moves_right() {
            rect.max_x
        } else {
            c.x
        };
        let y = if self.moves_top() {
            rect.min_y
        } else if self.moves_bottom() {
            rect.max_y
        } else {
            c.y
        };
        Point::new(x, y)
    }

    /// The eight squares of side `size` centered on the outline of `rect`.
    pub fn squares(rect: &Bounds, size: f64) -> Vec<(ResizeHandle, Bounds)> {
        Self::ALL
            .iter()
            .map(|&h| (h, Bounds::around(h.anchor(rect), size / 2.0)))
            .collect()
    }

    /// Rectangle produced by dragging this square by `delta`.
    ///
    /// Edges not driven by the square stay put. The moving edges stop at the
    /// minimum size, so the rectangle never flips.
    pub fn apply(self, start: &Bounds, delta: Point, min_width: f64, min_height: f64) -> Bounds {
        let mut b = *start;
        if self.moves_left() {
            b.min_x = (start.min_x + delta.x).min(start.max_x - min_width);
        }
        if self.moves_right() {
            b.max_x = (start.max_x + delta.x).max(start.min_x + min_width);
        }
        if self.moves_top() {
            b.min_y = (start.min_y + delta.y).min(start.max_y - min_height);
        }
        if self.moves_bottom() {
            b.max_y = (start.max_y + delta.y).max(start.min_y + min_height);
        }
        b
    }
}
