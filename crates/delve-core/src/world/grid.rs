//! Overworld coordinate grid
//!
//! Unbounded 2D store of overworld locations. Neighbors are always found by
//! coordinate arithmetic, never by following connection strings, so a step
//! north followed by a step south lands on the origin whatever the
//! connection data says.

use crate::error::GridError;

use super::direction::{Direction, step2};
use super::location::{Coordinates, Location};
use super::store::{LocationId, LocationStore};

/// An empty cell next to an occupied one: somewhere the world can grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrontierExit {
    /// The occupied cell.
    pub from: (i32, i32),
    pub direction: Direction,
    /// The empty cell.
    pub target: (i32, i32),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinateGrid {
    store: LocationStore<(i32, i32)>,
}

impl CoordinateGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `location` at (x, y). On `OccupiedCoordinate` or
    /// `DuplicateName` nothing changes.
    pub fn add_location(
        &mut self,
        mut location: Location,
        x: i32,
        y: i32,
    ) -> Result<LocationId, GridError> {
        location.set_coordinates(Coordinates::Overworld(x, y));
        location.is_overworld = true;
        let id = self.store.insert(location, (x, y))?;
        tracing::debug!(x, y, "Added overworld location");
        Ok(id)
    }

    pub fn get_by_coordinates(&self, x: i32, y: i32) -> Option<&Location> {
        self.store.at((x, y))
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Location> {
        self.store.named(name)
    }

    pub fn get_by_name_mut(&mut self, name: &str) -> Option<&mut Location> {
        self.store.named_mut(name)
    }

    pub fn coordinates_of(&self, name: &str) -> Option<(i32, i32)> {
        self.store.id_named(name).and_then(|id| self.store.key_of(id))
    }

    pub fn is_occupied(&self, x: i32, y: i32) -> bool {
        self.store.is_occupied((x, y))
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.store.contains_name(name)
    }

    /// The location one step from (x, y). Up and down have no overworld
    /// meaning and always yield `None`, as does a step off the plane.
    pub fn get_neighbor(&self, x: i32, y: i32, direction: Direction) -> Option<&Location> {
        let (nx, ny) = step2((x, y), direction)?;
        self.get_by_coordinates(nx, ny)
    }

    /// Record a two-way connection between (x, y) and its neighbor in
    /// `direction`. Returns false if either cell is empty.
    pub fn link(&mut self, x: i32, y: i32, direction: Direction) -> bool {
        let Some(other) = step2((x, y), direction) else {
            return false;
        };
        let (Some(here), Some(there)) = (self.store.id_at((x, y)), self.store.id_at(other)) else {
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

    /// Every (occupied cell, direction) whose neighbor cell is empty, in
    /// insertion order then north/south/east/west.
    pub fn find_frontier_exits(&self) -> Vec<FrontierExit> {
        let mut exits = Vec::new();
        for (x, y) in self.store.keys() {
            for direction in Direction::CARDINALS {
                let Some(target) = step2((x, y), direction) else {
                    continue;
                };
                if !self.store.is_occupied(target) {
                    exits.push(FrontierExit {
                        from: (x, y),
                        direction,
                        target,
                    });
                }
            }
        }
        exits
    }

    /// Liveness: the world can still grow somewhere. An empty grid counts as
    /// expandable since the first placement is always possible.
    pub fn has_expansion_exits(&self) -> bool {
        self.store.is_empty() || !self.find_frontier_exits().is_empty()
    }

    /// Diagnostic: true when no occupied cell borders an empty one. Live
    /// play should never reach this; seeing it means generation went wrong.
    pub fn validate_border_closure(&self) -> bool {
        !self.store.is_empty() && self.find_frontier_exits().is_empty()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Locations with their coordinates, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = ((i32, i32), &Location)> {
        self.store.iter()
    }

    pub fn indices_consistent(&self) -> bool {
        self.store.indices_consistent()
    }
}
