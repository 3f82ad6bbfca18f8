use std::collections::HashSet;

use crate::board::Board;
use crate::coordinate::Coordinate;

/// Outcome of resolving a single shot against a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotOutcome {
    Miss,
    Hit,
    Sunk,
    AlreadyShot,
}

/// Resolves a shot at `coordinate` against `board`, given the set of
/// coordinates already shot on that board (excluding `AlreadyShot` results,
/// per the invariant that duplicates are never recorded).
///
/// 1. If `coordinate` is already in `shot_coords`, returns `AlreadyShot`
///    without considering placements.
/// 2. If no placement covers `coordinate`, returns `Miss`.
/// 3. If every cell of the covering placement is in `shot_coords` (including
///    `coordinate` itself), returns `Sunk`; otherwise `Hit`.
pub fn resolve_shot(
    board: &Board,
    shot_coords: &HashSet<Coordinate>,
    coordinate: Coordinate,
) -> ShotOutcome {
    if shot_coords.contains(&coordinate) {
        return ShotOutcome::AlreadyShot;
    }

    let covering = board
        .placements()
        .iter()
        .find(|p| p.covered_cells().contains(&coordinate));

    let Some(placement) = covering else {
        return ShotOutcome::Miss;
    };

    let mut hit_so_far = shot_coords.clone();
    hit_so_far.insert(coordinate);

    let sunk = placement
        .covered_cells()
        .iter()
        .all(|c| hit_so_far.contains(c));

    if sunk {
        ShotOutcome::Sunk
    } else {
        ShotOutcome::Hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ship::{Orientation, ShipKind, ShipPlacement};

    fn board_with_carrier() -> Board {
        let mut b = Board::new(10, 10, "owner".to_string());
        b.place(ShipPlacement::new(
            ShipKind::Carrier,
            Coordinate::new(0, 0),
            Orientation::Vertical,
        ))
        .unwrap();
        b
    }

    #[test]
    fn miss_on_empty_cell() {
        let b = board_with_carrier();
        let shots = HashSet::new();
        assert_eq!(
            resolve_shot(&b, &shots, Coordinate::new(5, 5)),
            ShotOutcome::Miss
        );
    }

    #[test]
    fn hit_then_sunk_as_cells_accumulate() {
        let b = board_with_carrier();
        let mut shots = HashSet::new();

        for y in 0..4 {
            let outcome = resolve_shot(&b, &shots, Coordinate::new(0, y));
            assert_eq!(outcome, ShotOutcome::Hit);
            shots.insert(Coordinate::new(0, y));
        }

        let outcome = resolve_shot(&b, &shots, Coordinate::new(0, 4));
        assert_eq!(outcome, ShotOutcome::Sunk);
    }

    #[test]
    fn already_shot_does_not_reconsider_placement() {
        let b = board_with_carrier();
        let mut shots = HashSet::new();
        shots.insert(Coordinate::new(0, 0));
        assert_eq!(
            resolve_shot(&b, &shots, Coordinate::new(0, 0)),
            ShotOutcome::AlreadyShot
        );
    }
}
