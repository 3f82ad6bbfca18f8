use crate::error::Error;
use crate::ship::ShipKind;

/// Parses a fleet definition of the form `"2x2,2x3,1x4,1x5"` (count "x" size,
/// comma separated) into the flat multiset of ship kinds it describes.
///
/// Fails with `InvalidConfig` on malformed input or when the total occupied
/// cell count exceeds `width * height`.
pub fn parse_fleet(definition: &str, width: u32, height: u32) -> crate::Result<Vec<ShipKind>> {
    let mut fleet = Vec::new();

    for group in definition.split(',') {
        let group = group.trim();
        if group.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "empty group in fleet definition {definition:?}"
            )));
        }

        let (count_str, size_str) = group.split_once('x').ok_or_else(|| {
            Error::InvalidConfig(format!("malformed fleet group {group:?}, expected NxS"))
        })?;

        let count: u32 = count_str.trim().parse().map_err(|_| {
            Error::InvalidConfig(format!("malformed ship count in group {group:?}"))
        })?;
        let size: u32 = size_str.trim().parse().map_err(|_| {
            Error::InvalidConfig(format!("malformed ship size in group {group:?}"))
        })?;

        if count == 0 || size == 0 {
            return Err(Error::InvalidConfig(format!(
                "group {group:?} must have positive count and size"
            )));
        }

        let kind = ShipKind::from_size(size)?;
        fleet.extend(std::iter::repeat(kind).take(count as usize));
    }

    if fleet.is_empty() {
        return Err(Error::InvalidConfig(format!(
            "fleet definition {definition:?} describes no ships"
        )));
    }

    let total_cells: u32 = fleet.iter().map(|kind| kind.size()).sum();
    if total_cells > width * height {
        return Err(Error::InvalidConfig(format!(
            "fleet occupies {total_cells} cells, board only has {}",
            width * height
        )));
    }

    Ok(fleet)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_default_fleet() {
        let fleet = parse_fleet("2x2,2x3,1x4,1x5", 10, 10).unwrap();
        assert_eq!(fleet.len(), 6);
        let total: u32 = fleet.iter().map(|k| k.size()).sum();
        assert_eq!(total, 2 * 2 + 2 * 3 + 4 + 5);
    }

    #[test]
    fn rejects_malformed_group() {
        assert!(parse_fleet("2x2,bogus", 10, 10).is_err());
    }

    #[test]
    fn rejects_zero_count() {
        assert!(parse_fleet("0x3", 10, 10).is_err());
    }

    #[test]
    fn rejects_unknown_ship_size() {
        assert!(parse_fleet("1x7", 10, 10).is_err());
    }

    #[test]
    fn rejects_fleet_too_large_for_board() {
        assert!(parse_fleet("10x5", 4, 4).is_err());
    }
}
