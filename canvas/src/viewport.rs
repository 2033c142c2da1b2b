#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use serde::{Deserialize, Serialize};

/// A point in either screen or board space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - origin`.
    #[must_use]
    pub fn delta_from(self, origin: Point) -> Point {
        Point { x: self.x - origin.x, y: self.y - origin.y }
    }
}

/// Width and height in board units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether the host has reported a real, non-empty board size.
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point { x: self.width / 2.0, y: self.height / 2.0 }
    }
}

/// Placement of the board on screen.
///
/// `origin` is the screen position (CSS pixels) of the board's top-left
/// corner. `size` is the board's visible extent. Board-local coordinates have
/// their origin at the board's top-left corner and use the same unit as the
/// screen.
#[derive(Debug, Clone, Copy, Default)]
pub struct Viewport {
    pub origin: Point,
    pub size: Size,
}

impl Viewport {
    #[must_use]
    pub fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    /// Convert a screen-space point to board-local coordinates.
    #[must_use]
    pub fn screen_to_board(&self, screen: Point) -> Point {
        screen.delta_from(self.origin)
    }

    /// Convert a board-local point to screen coordinates.
    #[must_use]
    pub fn board_to_screen(&self, board: Point) -> Point {
        Point { x: board.x + self.origin.x, y: board.y + self.origin.y }
    }
}
