//! Bounded multi-level interiors
//!
//! A `SubGrid` is the 3D interior of exactly one overworld location (its
//! parent, referenced by name only). Every stored location lies inside the
//! inclusive bounds; adjacent z-levels are expected to share at least one
//! (x, y) so stairs can join them.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::generation::RoomType;

use super::direction::{Direction, step3};
use super::location::{Category, Coordinates, Location};
use super::store::{LocationId, LocationStore};

/// Inclusive interior extents. Serialized as a 6-int array; a legacy 4-int
/// array (no z extents) loads as z in {0}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<i32>", into = "[i32; 6]")]
pub struct SubGridBounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
    pub min_z: i32,
    pub max_z: i32,
}

impl SubGridBounds {
    pub const fn new(min_x: i32, max_x: i32, min_y: i32, max_y: i32, min_z: i32, max_z: i32) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
            min_z,
            max_z,
        }
    }

    /// Flat bounds, as stored by the oldest interior format.
    pub const fn flat(min_x: i32, max_x: i32, min_y: i32, max_y: i32) -> Self {
        Self::new(min_x, max_x, min_y, max_y, 0, 0)
    }

    pub fn contains(&self, (x, y, z): (i32, i32, i32)) -> bool {
        (self.min_x..=self.max_x).contains(&x)
            && (self.min_y..=self.max_y).contains(&y)
            && (self.min_z..=self.max_z).contains(&z)
    }

    pub fn width(&self) -> i32 {
        self.max_x.saturating_sub(self.min_x).saturating_add(1).max(0)
    }

    pub fn height(&self) -> i32 {
        self.max_y.saturating_sub(self.min_y).saturating_add(1).max(0)
    }

    /// The point nearest the local origin that lies inside the bounds.
    pub fn clamp_origin(&self) -> (i32, i32, i32) {
        (
            0i32.clamp(self.min_x, self.max_x.max(self.min_x)),
            0i32.clamp(self.min_y, self.max_y.max(self.min_y)),
            0i32.clamp(self.min_z, self.max_z.max(self.min_z)),
        )
    }

    /// z-levels ordered outward from the ground level: 0 first, then the
    /// direction the bounds extend.
    pub fn levels_from_ground(&self) -> Vec<i32> {
        let ground = self.clamp_origin().2;
        let mut levels = vec![ground];
        levels.extend((ground + 1)..=self.max_z);
        levels.extend((self.min_z..ground).rev());
        levels
    }

    pub fn as_array(&self) -> [i32; 6] {
        [
            self.min_x, self.max_x, self.min_y, self.max_y, self.min_z, self.max_z,
        ]
    }
}

impl From<SubGridBounds> for [i32; 6] {
    fn from(bounds: SubGridBounds) -> Self {
        bounds.as_array()
    }
}

impl TryFrom<Vec<i32>> for SubGridBounds {
    type Error = String;

    fn try_from(raw: Vec<i32>) -> Result<Self, Self::Error> {
        let bounds = match raw.as_slice() {
            [min_x, max_x, min_y, max_y] => SubGridBounds::flat(*min_x, *max_x, *min_y, *max_y),
            [min_x, max_x, min_y, max_y, min_z, max_z] => {
                SubGridBounds::new(*min_x, *max_x, *min_y, *max_y, *min_z, *max_z)
            }
            other => return Err(format!("expected 4 or 6 bound values, got {}", other.len())),
        };
        if bounds.min_x > bounds.max_x || bounds.min_y > bounds.max_y || bounds.min_z > bounds.max_z {
            return Err(format!("inverted bounds {}", bounds));
        }
        Ok(bounds)
    }
}

impl fmt::Display for SubGridBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {}, {}, {})",
            self.min_x, self.max_x, self.min_y, self.max_y, self.min_z, self.max_z
        )
    }
}

/// Interior extents for a category. Subterranean categories descend (negative
/// z), towers ascend, settlements stay on the ground level.
pub fn get_subgrid_bounds(category: &Category) -> SubGridBounds {
    match category {
        Category::Dungeon => SubGridBounds::new(-3, 3, -3, 3, -2, 0),
        Category::Cave => SubGridBounds::new(-4, 4, -4, 4, -1, 0),
        Category::Ruins | Category::Temple => SubGridBounds::new(-2, 2, -2, 2, -1, 0),
        Category::Tower => SubGridBounds::new(-1, 1, -1, 1, 0, 4),
        Category::City => SubGridBounds::new(-4, 4, -4, 4, 0, 0),
        Category::Town => SubGridBounds::new(-3, 3, -3, 3, 0, 0),
        Category::Village => SubGridBounds::new(-2, 2, -2, 2, 0, 0),
        _ => SubGridBounds::new(-2, 2, -2, 2, 0, 0),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubGrid {
    store: LocationStore<(i32, i32, i32)>,
    bounds: SubGridBounds,
    parent_name: String,
}

impl SubGrid {
    pub fn new(parent_name: impl Into<String>, bounds: SubGridBounds) -> Self {
        Self {
            store: LocationStore::new(),
            bounds,
            parent_name: parent_name.into(),
        }
    }

    pub fn for_category(parent_name: impl Into<String>, category: &Category) -> Self {
        Self::new(parent_name, get_subgrid_bounds(category))
    }

    pub fn bounds(&self) -> SubGridBounds {
        self.bounds
    }

    pub fn parent_name(&self) -> &str {
        &self.parent_name
    }

    /// Place `location` at (x, y, z). Rejected without mutation when out of
    /// bounds, occupied, or the name is taken.
    pub fn add_location(
        &mut self,
        mut location: Location,
        x: i32,
        y: i32,
        z: i32,
    ) -> Result<LocationId, GridError> {
        if !self.bounds.contains((x, y, z)) {
            return Err(GridError::OutOfBounds {
                coords: format!("({}, {}, {})", x, y, z),
                bounds: self.bounds.to_string(),
            });
        }
        location.set_coordinates(Coordinates::Interior(x, y, z));
        location.is_overworld = false;
        if location.parent_location.is_none() {
            location.parent_location = Some(self.parent_name.clone());
        }
        let id = self.store.insert(location, (x, y, z))?;
        tracing::debug!(parent = %self.parent_name, x, y, z, "Added interior location");
        Ok(id)
    }

    pub fn get_by_coordinates(&self, x: i32, y: i32, z: i32) -> Option<&Location> {
        self.store.at((x, y, z))
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Location> {
        self.store.named(name)
    }

    pub fn get_by_name_mut(&mut self, name: &str) -> Option<&mut Location> {
        self.store.named_mut(name)
    }

    pub fn coordinates_of(&self, name: &str) -> Option<(i32, i32, i32)> {
        self.store.id_named(name).and_then(|id| self.store.key_of(id))
    }

    pub fn is_occupied(&self, x: i32, y: i32, z: i32) -> bool {
        self.store.is_occupied((x, y, z))
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.store.contains_name(name)
    }

    pub fn get_neighbor(&self, x: i32, y: i32, z: i32, direction: Direction) -> Option<&Location> {
        let (nx, ny, nz) = step3((x, y, z), direction)?;
        self.get_by_coordinates(nx, ny, nz)
    }

    /// Two-way connection between (x, y, z) and its neighbor in `direction`.
    pub fn link(&mut self, coords: (i32, i32, i32), direction: Direction) -> bool {
        let Some(other) = step3(coords, direction) else {
            return false;
        };
        let (Some(here), Some(there)) = (self.store.id_at(coords), self.store.id_at(other)) else {
            return false;
        };
        let here_name = self.store.get(here).map(|l| l.name().to_string());
        let there_name = self.store.get(there).map(|l| l.name().to_string());
        if let (Some(here_name), Some(there_name)) = (here_name, there_name) {
            if let Some(loc) = self.store.get_mut(here) {
                loc.connect(direction, there_name);
            }
            if let Some(loc) = self.store.get_mut(there) {
                loc.connect(direction.opposite(), here_name);
            }
            return true;
        }
        false
    }

    /// The room the interior is entered through: the first exit point
    /// placed, else a room typed `Entry`.
    pub fn entry(&self) -> Option<&Location> {
        self.exit_points().next().or_else(|| {
            self.store
                .iter()
                .map(|(_, loc)| loc)
                .find(|loc| loc.room_type == Some(RoomType::Entry))
        })
    }

    pub fn exit_points(&self) -> impl Iterator<Item = &Location> {
        self.store.iter().map(|(_, loc)| loc).filter(|loc| loc.is_exit_point)
    }

    /// Occupied z-levels, ascending.
    pub fn levels(&self) -> BTreeSet<i32> {
        self.store.keys().map(|(_, _, z)| z).collect()
    }

    /// Every pair of consecutive occupied levels shares at least one (x, y).
    pub fn check_vertical_connectivity(&self) -> bool {
        self.vertical_gaps().is_empty()
    }

    /// Consecutive occupied level pairs `(lower, upper)` with no shared (x, y).
    pub fn vertical_gaps(&self) -> Vec<(i32, i32)> {
        let mut footprints: BTreeMap<i32, BTreeSet<(i32, i32)>> = BTreeMap::new();
        for (x, y, z) in self.store.keys() {
            footprints.entry(z).or_default().insert((x, y));
        }
        let levels: Vec<&i32> = footprints.keys().collect();
        levels
            .windows(2)
            .filter(|pair| {
                let (lower, upper) = (*pair[0], *pair[1]);
                footprints[&lower].is_disjoint(&footprints[&upper])
            })
            .map(|pair| (*pair[0], *pair[1]))
            .collect()
    }

    /// Names reachable from `start` through unblocked connections that stay
    /// inside this interior.
    pub fn reachable_from(&self, start: &str) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        if !self.contains_name(start) {
            return seen;
        }
        let mut queue = VecDeque::from([start.to_string()]);
        seen.insert(start.to_string());
        while let Some(name) = queue.pop_front() {
            let Some(loc) = self.get_by_name(&name) else {
                continue;
            };
            for (_, target) in loc.open_connections() {
                if self.contains_name(target) && seen.insert(target.to_string()) {
                    queue.push_back(target.to_string());
                }
            }
        }
        seen
    }

    /// In-bounds empty cells horizontally next to occupied ones.
    pub fn find_frontier_cells(&self) -> Vec<((i32, i32, i32), Direction)> {
        let mut cells = Vec::new();
        for coords in self.store.keys() {
            for direction in Direction::CARDINALS {
                let Some(target) = step3(coords, direction) else {
                    continue;
                };
                if self.bounds.contains(target) && !self.store.is_occupied(target) {
                    cells.push((coords, direction));
                }
            }
        }
        cells
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ((i32, i32, i32), &Location)> {
        self.store.iter()
    }

    pub fn indices_consistent(&self) -> bool {
        self.store.indices_consistent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(name: &str) -> Location {
        Location::new(name, Category::Dungeon)
    }

    #[test]
    fn test_bounds_table_vertical_extents() {
        let dungeon = get_subgrid_bounds(&Category::Dungeon);
        assert!(dungeon.min_z < 0 && dungeon.max_z == 0);
        let cave = get_subgrid_bounds(&Category::Cave);
        assert!(cave.min_z < 0);
        let tower = get_subgrid_bounds(&Category::Tower);
        assert!(tower.min_z == 0 && tower.max_z > 0);
        for settlement in [Category::Town, Category::Village, Category::City] {
            let b = get_subgrid_bounds(&settlement);
            assert_eq!((b.min_z, b.max_z), (0, 0));
        }
    }

    #[test]
    fn test_add_enforces_bounds() {
        let mut sub = SubGrid::for_category("Barrow", &Category::Dungeon);
        let before = sub.clone();
        let err = sub.add_location(room("Deep Hall"), 0, 0, -5).unwrap_err();
        assert!(matches!(err, GridError::OutOfBounds { .. }));
        assert_eq!(sub, before);
        assert!(sub.add_location(room("Antechamber"), 0, 0, 0).is_ok());
    }

    #[test]
    fn test_add_sets_parent_and_coordinates() {
        let mut sub = SubGrid::for_category("Barrow", &Category::Dungeon);
        sub.add_location(room("Antechamber"), 1, 0, -1).unwrap();
        let loc = sub.get_by_name("Antechamber").unwrap();
        assert_eq!(loc.parent_location.as_deref(), Some("Barrow"));
        assert_eq!(loc.coordinates(), Some(Coordinates::Interior(1, 0, -1)));
        assert!(!loc.is_overworld);
    }

    #[test]
    fn test_duplicate_rejected_3d() {
        let mut sub = SubGrid::for_category("Barrow", &Category::Dungeon);
        sub.add_location(room("Antechamber"), 0, 0, 0).unwrap();
        assert!(matches!(
            sub.add_location(room("Other"), 0, 0, 0),
            Err(GridError::OccupiedCoordinate(_))
        ));
        assert!(matches!(
            sub.add_location(room("Antechamber"), 0, 0, -1),
            Err(GridError::DuplicateName(_))
        ));
    }

    #[test]
    fn test_vertical_neighbor_and_gaps() {
        let mut sub = SubGrid::for_category("Barrow", &Category::Dungeon);
        sub.add_location(room("Top"), 0, 0, 0).unwrap();
        sub.add_location(room("Below"), 0, 0, -1).unwrap();
        sub.add_location(room("Bottom Far"), 2, 2, -2).unwrap();
        assert_eq!(sub.get_neighbor(0, 0, 0, Direction::Down).unwrap().name(), "Below");
        assert_eq!(sub.get_neighbor(0, 0, -1, Direction::Up).unwrap().name(), "Top");
        assert_eq!(sub.vertical_gaps(), vec![(-2, -1)]);
        assert!(!sub.check_vertical_connectivity());

        sub.add_location(room("Stair Foot"), 2, 2, -1).unwrap();
        assert!(sub.check_vertical_connectivity());
    }

    #[test]
    fn test_reachable_respects_blocks() {
        let mut sub = SubGrid::for_category("Barrow", &Category::Dungeon);
        sub.add_location(room("Aa"), 0, 0, 0).unwrap();
        sub.add_location(room("Bb"), 1, 0, 0).unwrap();
        assert!(sub.link((0, 0, 0), Direction::East));
        assert_eq!(sub.reachable_from("Aa").len(), 2);
        sub.get_by_name_mut("Aa").unwrap().block(Direction::East);
        assert_eq!(sub.reachable_from("Aa").len(), 1);
    }

    #[test]
    fn test_entry_is_the_exit_point_not_the_origin() {
        let mut sub = SubGrid::for_category("Greywater", &Category::Town);
        sub.add_location(room("Market Cross"), 0, 0, 0).unwrap();
        let mut gate = room("South Gate");
        gate.is_exit_point = true;
        sub.add_location(gate, 0, -3, 0).unwrap();
        assert_eq!(sub.entry().unwrap().name(), "South Gate");

        let mut typed = SubGrid::for_category("Greywater", &Category::Town);
        typed.add_location(room("Market Cross"), 0, 0, 0).unwrap();
        let mut gate = room("South Gate");
        gate.room_type = Some(RoomType::Entry);
        typed.add_location(gate, 0, -3, 0).unwrap();
        assert_eq!(typed.entry().unwrap().name(), "South Gate");

        assert!(SubGrid::for_category("Empty", &Category::Town).entry().is_none());
    }

    #[test]
    fn test_levels_and_frontier_cells() {
        let mut sub = SubGrid::new("Well", SubGridBounds::new(0, 1, 0, 0, -1, 0));
        sub.add_location(room("Well Head"), 0, 0, 0).unwrap();
        sub.add_location(room("Well Bottom"), 0, 0, -1).unwrap();
        assert_eq!(sub.levels().into_iter().collect::<Vec<_>>(), vec![-1, 0]);
        let cells = sub.find_frontier_cells();
        assert_eq!(
            cells,
            vec![((0, 0, 0), Direction::East), ((0, 0, -1), Direction::East)]
        );
    }

    #[test]
    fn test_extreme_bounds_do_not_overflow() {
        let edge = SubGridBounds::new(i32::MAX - 1, i32::MAX, 0, 0, 0, 0);
        assert_eq!(edge.width(), 2);
        let mut sub = SubGrid::new("Rim", edge);
        sub.add_location(room("Rim Walk"), i32::MAX, 0, 0).unwrap();
        assert!(sub.get_neighbor(i32::MAX, 0, 0, Direction::East).is_none());
        assert!(!sub.link((i32::MAX, 0, 0), Direction::East));
        assert_eq!(sub.find_frontier_cells(), vec![((i32::MAX, 0, 0), Direction::West)]);
        assert_eq!(SubGridBounds::new(i32::MIN, i32::MAX, 0, 0, 0, 0).width(), i32::MAX);
    }

    #[test]
    fn test_bounds_serde_accepts_legacy() {
        let b: SubGridBounds = serde_json::from_str("[-1,1,-2,2]").unwrap();
        assert_eq!(b, SubGridBounds::new(-1, 1, -2, 2, 0, 0));
        let b: SubGridBounds = serde_json::from_str("[-1,1,-2,2,-3,0]").unwrap();
        assert_eq!(b.min_z, -3);
        assert_eq!(serde_json::to_string(&b).unwrap(), "[-1,1,-2,2,-3,0]");
        assert!(serde_json::from_str::<SubGridBounds>("[1,2,3]").is_err());
        assert!(serde_json::from_str::<SubGridBounds>("[3,1,0,0]").is_err());
    }

    #[test]
    fn test_levels_from_ground() {
        assert_eq!(
            SubGridBounds::new(-1, 1, -1, 1, -2, 0).levels_from_ground(),
            vec![0, -1, -2]
        );
        assert_eq!(
            SubGridBounds::new(-1, 1, -1, 1, 0, 2).levels_from_ground(),
            vec![0, 1, 2]
        );
    }
}
