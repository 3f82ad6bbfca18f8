use serde::{Deserialize, Serialize};

/// A 0-based position on a board. Equality is structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: u32,
    pub y: u32,
}

impl Coordinate {
    pub fn new(x: u32, y: u32) -> Self {
        Coordinate { x, y }
    }

    pub fn in_bounds(&self, width: u32, height: u32) -> bool {
        self.x < width && self.y < height
    }
}
