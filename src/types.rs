//! Small geometry types shared by the model, the overlay and the X11 layer

use serde::{Deserialize, Serialize};

/// Top-left screen coordinate, stored on disk as `[x, y]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Sum of absolute coordinate differences
    pub fn manhattan_distance(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }
}

impl std::ops::Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x.saturating_sub(rhs.x), self.y.saturating_sub(rhs.y))
    }
}

impl From<[i32; 2]> for Position {
    fn from([x, y]: [i32; 2]) -> Self {
        Self::new(x, y)
    }
}

impl From<Position> for [i32; 2] {
    fn from(p: Position) -> Self {
        [p.x, p.y]
    }
}

/// Button width/height, stored on disk as `[w, h]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl From<[u32; 2]> for Dimensions {
    fn from([width, height]: [u32; 2]) -> Self {
        Self::new(width, height)
    }
}

impl From<Dimensions> for [u32; 2] {
    fn from(d: Dimensions) -> Self {
        [d.width, d.height]
    }
}

/// Usable area of the screen a button lives on (excludes panels/docks)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenArea {
    pub width: u32,
    pub height: u32,
}

impl ScreenArea {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Saturate `candidate` so a box of `size` stays inside `[0, w-width] x [0, h-height]`.
    /// A box larger than the screen pins to 0 on that axis.
    pub fn clamp(&self, candidate: Position, size: Dimensions) -> Position {
        let max_x = (self.width as i64 - size.width as i64).max(0);
        let max_y = (self.height as i64 - size.height as i64).max(0);
        Position::new(
            (candidate.x as i64).clamp(0, max_x) as i32,
            (candidate.y as i64).clamp(0, max_y) as i32,
        )
    }
}
