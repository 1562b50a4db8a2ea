//! Movement directions and their coordinate deltas

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// One of the six directions a connection can point.
///
/// Ordering is declaration order, which keeps `BTreeMap<Direction, _>`
/// iteration (and therefore serialized output) stable.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Direction {
    North,
    South,
    East,
    West,
    Up,
    Down,
}

impl Direction {
    /// The four horizontal directions, in scan order.
    pub const CARDINALS: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    pub const fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// Overworld delta. `None` for up/down, which have no 2D meaning.
    pub const fn delta2(self) -> Option<(i32, i32)> {
        match self {
            Direction::North => Some((0, 1)),
            Direction::South => Some((0, -1)),
            Direction::East => Some((1, 0)),
            Direction::West => Some((-1, 0)),
            Direction::Up | Direction::Down => None,
        }
    }

    /// Interior delta; up climbs toward positive z.
    pub const fn delta3(self) -> (i32, i32, i32) {
        match self {
            Direction::North => (0, 1, 0),
            Direction::South => (0, -1, 0),
            Direction::East => (1, 0, 0),
            Direction::West => (-1, 0, 0),
            Direction::Up => (0, 0, 1),
            Direction::Down => (0, 0, -1),
        }
    }

    pub const fn is_horizontal(self) -> bool {
        !matches!(self, Direction::Up | Direction::Down)
    }

    /// Direction that steps from `from` to `to`, if they are one unit apart
    /// along exactly one axis.
    pub fn between(from: (i32, i32, i32), to: (i32, i32, i32)) -> Option<Direction> {
        let delta = (
            i64::from(to.0) - i64::from(from.0),
            i64::from(to.1) - i64::from(from.1),
            i64::from(to.2) - i64::from(from.2),
        );
        match delta {
            (0, 1, 0) => Some(Direction::North),
            (0, -1, 0) => Some(Direction::South),
            (1, 0, 0) => Some(Direction::East),
            (-1, 0, 0) => Some(Direction::West),
            (0, 0, 1) => Some(Direction::Up),
            (0, 0, -1) => Some(Direction::Down),
            _ => None,
        }
    }

    /// Perpendicular horizontal directions, used when synthesising exits.
    pub const fn perpendicular(self) -> [Direction; 2] {
        match self {
            Direction::North | Direction::South | Direction::Up | Direction::Down => {
                [Direction::East, Direction::West]
            }
            Direction::East | Direction::West => [Direction::North, Direction::South],
        }
    }
}

/// Step an overworld coordinate one unit in `direction`. `None` for up and
/// down, and past the edge of the `i32` plane.
pub fn step2((x, y): (i32, i32), direction: Direction) -> Option<(i32, i32)> {
    let (dx, dy) = direction.delta2()?;
    Some((x.checked_add(dx)?, y.checked_add(dy)?))
}

/// Step a 3D coordinate one unit in `direction`. `None` past the edge of
/// the `i32` range.
pub fn step3((x, y, z): (i32, i32, i32), direction: Direction) -> Option<(i32, i32, i32)> {
    let (dx, dy, dz) = direction.delta3();
    Some((x.checked_add(dx)?, y.checked_add(dy)?, z.checked_add(dz)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_opposite_is_involution() {
        for dir in Direction::iter() {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_ne!(dir.opposite(), dir);
        }
    }

    #[test]
    fn test_deltas_cancel() {
        for dir in Direction::iter() {
            let (dx, dy, dz) = dir.delta3();
            let (ox, oy, oz) = dir.opposite().delta3();
            assert_eq!((dx + ox, dy + oy, dz + oz), (0, 0, 0));
        }
    }

    #[test]
    fn test_vertical_has_no_2d_delta() {
        assert!(Direction::Up.delta2().is_none());
        assert!(Direction::Down.delta2().is_none());
        assert_eq!(Direction::North.delta2(), Some((0, 1)));
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(Direction::from_str("North").unwrap(), Direction::North);
        assert_eq!(Direction::from_str("UP").unwrap(), Direction::Up);
        assert!(Direction::from_str("northeast").is_err());
        assert_eq!(Direction::West.to_string(), "west");
    }

    #[test]
    fn test_between() {
        assert_eq!(Direction::between((0, 0, 0), (0, 0, -1)), Some(Direction::Down));
        assert_eq!(Direction::between((1, 1, 0), (2, 1, 0)), Some(Direction::East));
        assert_eq!(Direction::between((0, 0, 0), (1, 1, 0)), None);
        assert_eq!(Direction::between((0, 0, 0), (0, 0, 0)), None);
        assert_eq!(Direction::between((i32::MIN, 0, 0), (i32::MAX, 0, 0)), None);
        assert_eq!(
            Direction::between((i32::MAX - 1, 0, 0), (i32::MAX, 0, 0)),
            Some(Direction::East)
        );
    }

    #[test]
    fn test_steps_stop_at_the_edge() {
        assert_eq!(step2((i32::MAX, 0), Direction::East), None);
        assert_eq!(step2((0, i32::MIN), Direction::South), None);
        assert_eq!(step2((i32::MAX, 0), Direction::West), Some((i32::MAX - 1, 0)));
        assert_eq!(step2((0, 0), Direction::Up), None);
        assert_eq!(step3((0, 0, i32::MAX), Direction::Up), None);
        assert_eq!(step3((0, 0, 0), Direction::Down), Some((0, 0, -1)));
    }
}
