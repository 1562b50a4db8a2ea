//! Locations and their categories
//!
//! A `Location` is identified by its name. Name and coordinates are private:
//! they are the keys of the owning grid's indices and only the grid may set
//! them.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::generation::RoomType;

use super::direction::Direction;
use super::subgrid::SubGrid;

/// What kind of place a location is. Drives generator choice and interior
/// bounds. Unknown strings are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Category {
    Dungeon,
    Cave,
    Ruins,
    Temple,
    Tower,
    Town,
    Village,
    City,
    #[default]
    Wilderness,
    Forest,
    Plains,
    Mountain,
    Other(String),
}

impl Category {
    /// Lenient, case-insensitive parse; never fails.
    pub fn parse(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        match lowered.as_str() {
            "dungeon" => Category::Dungeon,
            "cave" => Category::Cave,
            "ruins" => Category::Ruins,
            "temple" => Category::Temple,
            "tower" => Category::Tower,
            "town" => Category::Town,
            "village" => Category::Village,
            "city" => Category::City,
            "wilderness" => Category::Wilderness,
            "forest" => Category::Forest,
            "plains" => Category::Plains,
            "mountain" => Category::Mountain,
            _ => Category::Other(lowered),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Category::Dungeon => "dungeon",
            Category::Cave => "cave",
            Category::Ruins => "ruins",
            Category::Temple => "temple",
            Category::Tower => "tower",
            Category::Town => "town",
            Category::Village => "village",
            Category::City => "city",
            Category::Wilderness => "wilderness",
            Category::Forest => "forest",
            Category::Plains => "plains",
            Category::Mountain => "mountain",
            Category::Other(name) => name,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Category {
    fn from(raw: &str) -> Self {
        Category::parse(raw)
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        Category::parse(&raw)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl Serialize for Category {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Category::parse(&raw))
    }
}

/// Where a location sits: a 2-int overworld cell or a 3-int interior cell.
/// Serialized as a bare array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coordinates {
    Interior(i32, i32, i32),
    Overworld(i32, i32),
}

/// A chest placed by the depth pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treasure {
    pub lock_difficulty: u32,
    #[serde(default)]
    pub looted: bool,
}

/// A hidden feature; found when a perception roll meets `threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    pub threshold: u32,
    #[serde(default)]
    pub discovered: bool,
}

/// A place in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    coordinates: Option<Coordinates>,
    #[serde(default)]
    pub connections: BTreeMap<Direction, String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub blocked_directions: BTreeSet<Direction>,
    /// Name of the location whose interior holds this one. Never owning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_location: Option<String>,
    #[serde(skip)]
    sub_grid: Option<Box<SubGrid>>,
    #[serde(default)]
    pub is_exit_point: bool,
    #[serde(default)]
    pub is_overworld: bool,
    #[serde(default)]
    pub is_named: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_type: Option<RoomType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treasure: Option<Treasure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<Secret>,
    /// Key id required to enter, if the way in is locked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_by: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hazards: Vec<String>,
    #[serde(default)]
    pub danger_level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rival_party: Option<String>,
}

impl Location {
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            category,
            coordinates: None,
            connections: BTreeMap::new(),
            blocked_directions: BTreeSet::new(),
            parent_location: None,
            sub_grid: None,
            is_exit_point: false,
            is_overworld: false,
            is_named: false,
            room_type: None,
            treasure: None,
            secret: None,
            locked_by: None,
            keys: Vec::new(),
            hazards: Vec::new(),
            danger_level: 0,
            rival_party: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    pub(crate) fn set_coordinates(&mut self, coordinates: Coordinates) {
        self.coordinates = Some(coordinates);
    }

    pub fn sub_grid(&self) -> Option<&SubGrid> {
        self.sub_grid.as_deref()
    }

    pub fn sub_grid_mut(&mut self) -> Option<&mut SubGrid> {
        self.sub_grid.as_deref_mut()
    }

    pub fn has_sub_grid(&self) -> bool {
        self.sub_grid.is_some()
    }

    /// Attach an interior. A location owns at most one; an existing interior
    /// is never replaced and the rejected grid is handed back.
    pub fn attach_sub_grid(&mut self, sub_grid: SubGrid) -> Result<(), SubGrid> {
        if self.sub_grid.is_some() {
            return Err(sub_grid);
        }
        self.sub_grid = Some(Box::new(sub_grid));
        Ok(())
    }

    pub fn connection(&self, direction: Direction) -> Option<&str> {
        self.connections.get(&direction).map(String::as_str)
    }

    pub fn connect(&mut self, direction: Direction, target: impl Into<String>) {
        self.connections.insert(direction, target.into());
    }

    /// Mark an existing connection impassable. Returns false when there is
    /// nothing in that direction to block.
    pub fn block(&mut self, direction: Direction) -> bool {
        if !self.connections.contains_key(&direction) {
            return false;
        }
        self.blocked_directions.insert(direction)
    }

    pub fn unblock(&mut self, direction: Direction) -> bool {
        self.blocked_directions.remove(&direction)
    }

    pub fn is_passable(&self, direction: Direction) -> bool {
        self.connections.contains_key(&direction) && !self.blocked_directions.contains(&direction)
    }

    /// Connections that are not currently blocked.
    pub fn open_connections(&self) -> impl Iterator<Item = (Direction, &str)> {
        self.connections
            .iter()
            .filter(|(dir, _)| !self.blocked_directions.contains(dir))
            .map(|(dir, name)| (*dir, name.as_str()))
    }
}

/// Why a name was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameProblem {
    TooShort { len: usize, min: usize },
    TooLong { len: usize, max: usize },
}

impl fmt::Display for NameProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameProblem::TooShort { len, min } => {
                write!(f, "{} characters, minimum is {}", len, min)
            }
            NameProblem::TooLong { len, max } => {
                write!(f, "{} characters, maximum is {}", len, max)
            }
        }
    }
}

/// Check a name's length in characters after trimming whitespace.
pub fn check_name_length(name: &str, min: usize, max: usize) -> Result<(), NameProblem> {
    let len = name.trim().chars().count();
    if len < min {
        return Err(NameProblem::TooShort { len, min });
    }
    if len > max {
        return Err(NameProblem::TooLong { len, max });
    }
    Ok(())
}
