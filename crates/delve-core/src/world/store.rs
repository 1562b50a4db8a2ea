//! Location arena with name and coordinate indices
//!
//! Both grids keep their locations here. The arena owns every `Location`;
//! the two maps only hold `LocationId`s, and the single `insert` path checks
//! both keys before touching either map. Locations are never removed.

use std::fmt::Debug;
use std::hash::Hash;

use hashbrown::HashMap;

use crate::error::GridError;

use super::location::Location;

/// Handle into a `LocationStore`. Only meaningful for the store that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationId(u32);

impl LocationId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct LocationStore<K> {
    locations: Vec<Location>,
    keys: Vec<K>,
    by_coord: HashMap<K, LocationId>,
    by_name: HashMap<String, LocationId>,
}

impl<K> Default for LocationStore<K> {
    fn default() -> Self {
        Self {
            locations: Vec::new(),
            keys: Vec::new(),
            by_coord: HashMap::new(),
            by_name: HashMap::new(),
        }
    }
}

// The maps are derived from the arena, so comparing the arena is enough.
impl<K: PartialEq> PartialEq for LocationStore<K> {
    fn eq(&self, other: &Self) -> bool {
        self.keys == other.keys && self.locations == other.locations
    }
}

impl<K: Copy + Eq + Hash + Debug> LocationStore<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a location at `key`. Fails without mutation if either the key or
    /// the name is already taken.
    pub fn insert(&mut self, location: Location, key: K) -> Result<LocationId, GridError> {
        if self.by_coord.contains_key(&key) {
            return Err(GridError::OccupiedCoordinate(format!("{:?}", key)));
        }
        if self.by_name.contains_key(location.name()) {
            return Err(GridError::DuplicateName(location.name().to_string()));
        }

        let id = LocationId(self.locations.len() as u32);
        self.by_coord.insert(key, id);
        self.by_name.insert(location.name().to_string(), id);
        self.keys.push(key);
        self.locations.push(location);
        Ok(id)
    }

    pub fn get(&self, id: LocationId) -> Option<&Location> {
        self.locations.get(id.index())
    }

    pub fn get_mut(&mut self, id: LocationId) -> Option<&mut Location> {
        self.locations.get_mut(id.index())
    }

    pub fn key_of(&self, id: LocationId) -> Option<K> {
        self.keys.get(id.index()).copied()
    }

    pub fn id_at(&self, key: K) -> Option<LocationId> {
        self.by_coord.get(&key).copied()
    }

    pub fn id_named(&self, name: &str) -> Option<LocationId> {
        self.by_name.get(name).copied()
    }

    pub fn at(&self, key: K) -> Option<&Location> {
        self.id_at(key).and_then(|id| self.get(id))
    }

    pub fn named(&self, name: &str) -> Option<&Location> {
        self.id_named(name).and_then(|id| self.get(id))
    }

    pub fn named_mut(&mut self, name: &str) -> Option<&mut Location> {
        let id = self.id_named(name)?;
        self.get_mut(id)
    }

    pub fn is_occupied(&self, key: K) -> bool {
        self.by_coord.contains_key(&key)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Locations with their keys, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &Location)> {
        self.keys.iter().copied().zip(self.locations.iter())
    }

    /// Every key in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.keys.iter().copied()
    }

    /// Both indices resolve every arena slot and agree on it.
    pub fn indices_consistent(&self) -> bool {
        self.by_coord.len() == self.locations.len()
            && self.by_name.len() == self.locations.len()
            && self.locations.iter().zip(self.keys.iter()).enumerate().all(
                |(i, (loc, key))| {
                    let id = LocationId(i as u32);
                    self.by_coord.get(key) == Some(&id) && self.by_name.get(loc.name()) == Some(&id)
                },
            )
    }
}
