use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;
use crate::error::Error;

/// A ship type, identified by its compile-time-fixed size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShipKind {
    Destroyer,
    Cruiser,
    Battleship,
    Carrier,
}

impl ShipKind {
    pub const ALL: [ShipKind; 4] = [
        ShipKind::Destroyer,
        ShipKind::Cruiser,
        ShipKind::Battleship,
        ShipKind::Carrier,
    ];

    pub fn size(&self) -> u32 {
        match self {
            ShipKind::Destroyer => 2,
            ShipKind::Cruiser => 3,
            ShipKind::Battleship => 4,
            ShipKind::Carrier => 5,
        }
    }

    pub fn from_size(size: u32) -> crate::Result<Self> {
        ShipKind::ALL
            .into_iter()
            .find(|kind| kind.size() == size)
            .ok_or_else(|| Error::InvalidConfig(format!("no ship kind has size {size}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    fn axis(&self) -> (i64, i64) {
        match self {
            Orientation::Horizontal => (1, 0),
            Orientation::Vertical => (0, 1),
        }
    }
}

/// A ship anchored at `start` with `orientation`. Its covered cells are
/// derived, never stored separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipPlacement {
    pub ship: ShipKind,
    pub start: Coordinate,
    pub orientation: Orientation,
}

impl ShipPlacement {
    pub fn new(ship: ShipKind, start: Coordinate, orientation: Orientation) -> Self {
        ShipPlacement {
            ship,
            start,
            orientation,
        }
    }

    /// The coordinates this placement covers: `start + i * axis` for
    /// `i in [0, size)`. Coordinates that would underflow (off the top/left
    /// edge) are simply out of bounds, not a panic, since `x`/`y` are
    /// unsigned; callers must bounds-check the result, not this call.
    pub fn covered_cells(&self) -> Vec<Coordinate> {
        let (dx, dy) = self.orientation.axis();
        (0..self.ship.size() as i64)
            .map(|i| {
                let x = self.start.x as i64 + dx * i;
                let y = self.start.y as i64 + dy * i;
                Coordinate {
                    x: x.max(0) as u32,
                    y: y.max(0) as u32,
                }
            })
            .collect()
    }

    /// True iff every covered cell lies within `[0, width) x [0, height)`.
    /// Unlike `covered_cells`, this does not clamp — it checks the real,
    /// possibly-negative coordinates so an off-grid placement is rejected
    /// rather than silently clamped onto the edge.
    pub fn within_bounds(&self, width: u32, height: u32) -> bool {
        let (dx, dy) = self.orientation.axis();
        (0..self.ship.size() as i64).all(|i| {
            let x = self.start.x as i64 + dx * i;
            let y = self.start.y as i64 + dy * i;
            x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height
        })
    }
}
