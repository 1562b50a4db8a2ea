//! Save and restore worlds
//!
//! The overworld is written as a JSON list of location records, each with
//! its `[x, y]` coordinates. A location that owns an interior carries it
//! inline as `sub_grid: {parent_name, bounds, locations}` with `[x, y, z]`
//! coordinates and 6-int bounds.
//!
//! Loading also accepts the older shapes: 4-int interior bounds (a single
//! level at z = 0) and the original name-to-record map with no coordinates
//! at all, which comes back as an un-gridded world.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SaveError;
use crate::world::{CoordinateGrid, Coordinates, Location, SubGrid, SubGridBounds};

#[derive(Serialize)]
struct LocationRecordRef<'a> {
    #[serde(flatten)]
    location: &'a Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    sub_grid: Option<SubGridRecordRef<'a>>,
}

#[derive(Serialize)]
struct SubGridRecordRef<'a> {
    parent_name: &'a str,
    bounds: SubGridBounds,
    locations: Vec<LocationRecordRef<'a>>,
}

impl<'a> LocationRecordRef<'a> {
    fn new(location: &'a Location) -> Self {
        Self {
            location,
            sub_grid: location.sub_grid().map(|sub| SubGridRecordRef {
                parent_name: sub.parent_name(),
                bounds: sub.bounds(),
                locations: sub.iter().map(|(_, loc)| LocationRecordRef::new(loc)).collect(),
            }),
        }
    }
}

/// A stored location and, if it owns one, its interior.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationRecord {
    #[serde(flatten)]
    pub location: Location,
    #[serde(default)]
    pub sub_grid: Option<SubGridRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubGridRecord {
    pub parent_name: String,
    pub bounds: SubGridBounds,
    #[serde(default)]
    pub locations: Vec<LocationRecord>,
}

/// What a save file turned out to hold.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedWorld {
    Gridded(CoordinateGrid),
    /// Oldest format: locations by name, never placed on a grid.
    Ungridded(BTreeMap<String, Location>),
}

impl LoadedWorld {
    pub fn into_grid(self) -> Option<CoordinateGrid> {
        match self {
            LoadedWorld::Gridded(grid) => Some(grid),
            LoadedWorld::Ungridded(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            LoadedWorld::Gridded(grid) => grid.len(),
            LoadedWorld::Ungridded(locations) => locations.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn world_to_json(grid: &CoordinateGrid) -> Result<String, SaveError> {
    let records: Vec<LocationRecordRef<'_>> =
        grid.iter().map(|(_, loc)| LocationRecordRef::new(loc)).collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

pub fn world_from_json(json: &str) -> Result<LoadedWorld, SaveError> {
    match serde_json::from_str::<Value>(json)? {
        Value::Array(items) => {
            let records: Vec<LocationRecord> = serde_json::from_value(Value::Array(items))?;
            Ok(LoadedWorld::Gridded(grid_from_records(records)?))
        }
        Value::Object(map) => {
            let mut locations = BTreeMap::new();
            for (name, mut record) in map {
                if let Value::Object(fields) = &mut record {
                    fields
                        .entry("name")
                        .or_insert_with(|| Value::String(name.clone()));
                }
                let location: Location = serde_json::from_value(record)?;
                locations.insert(name, location);
            }
            tracing::info!(locations = locations.len(), "Loaded legacy un-gridded world");
            Ok(LoadedWorld::Ungridded(locations))
        }
        other => Err(SaveError::UnsupportedFormat(format!(
            "expected a list or map of locations, found {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}

/// Rebuild the overworld. Fails on the first record that has no overworld
/// coordinates or collides with an earlier one.
pub fn grid_from_records(records: Vec<LocationRecord>) -> Result<CoordinateGrid, SaveError> {
    let mut grid = CoordinateGrid::new();
    for record in records {
        let (x, y) = match record.location.coordinates() {
            Some(Coordinates::Overworld(x, y)) => (x, y),
            other => {
                return Err(SaveError::UnsupportedFormat(format!(
                    "overworld location '{}' has coordinates {:?}",
                    record.location.name(),
                    other
                )));
            }
        };
        let location = with_interior(record.location, record.sub_grid)?;
        grid.add_location(location, x, y)?;
    }
    Ok(grid)
}

fn sub_grid_from_record(record: SubGridRecord) -> Result<SubGrid, SaveError> {
    let mut sub = SubGrid::new(record.parent_name, record.bounds);
    for room in record.locations {
        let (x, y, z) = match room.location.coordinates() {
            Some(Coordinates::Interior(x, y, z)) => (x, y, z),
            Some(Coordinates::Overworld(x, y)) => (x, y, 0),
            None => {
                return Err(SaveError::UnsupportedFormat(format!(
                    "interior location '{}' has no coordinates",
                    room.location.name()
                )));
            }
        };
        let location = with_interior(room.location, room.sub_grid)?;
        sub.add_location(location, x, y, z)?;
    }
    Ok(sub)
}

fn with_interior(mut location: Location, record: Option<SubGridRecord>) -> Result<Location, SaveError> {
    if let Some(record) = record {
        let sub = sub_grid_from_record(record)?;
        location.attach_sub_grid(sub).map_err(|_| {
            SaveError::UnsupportedFormat(format!("'{}' has two interiors", location.name()))
        })?;
    }
    Ok(location)
}

pub fn save_world(grid: &CoordinateGrid, path: &Path) -> Result<(), SaveError> {
    let json = world_to_json(grid)?;
    std::fs::write(path, json)?;
    tracing::info!(path = %path.display(), locations = grid.len(), "World saved");
    Ok(())
}

pub fn load_world(path: &Path) -> Result<LoadedWorld, SaveError> {
    let json = std::fs::read_to_string(path)?;
    let world = world_from_json(&json)?;
    tracing::info!(path = %path.display(), locations = world.len(), "World loaded");
    Ok(world)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GridError;
    use crate::world::{Category, Direction, Treasure};

    fn sample_world() -> CoordinateGrid {
        let mut grid = CoordinateGrid::new();
        grid.add_location(Location::new("Crossroads", Category::Plains), 0, 0)
            .unwrap();

        let mut barrow = Location::new("Barrow", Category::Dungeon).with_description("A low mound");
        barrow.is_exit_point = true;
        let mut sub = SubGrid::for_category("Barrow", &Category::Dungeon);
        let mut hall = Location::new("Hall", Category::Dungeon);
        hall.is_exit_point = true;
        sub.add_location(hall, 0, 0, 0).unwrap();
        let mut crypt = Location::new("Crypt", Category::Dungeon);
        crypt.treasure = Some(Treasure {
            lock_difficulty: 9,
            looted: false,
        });
        sub.add_location(crypt, 0, 0, -1).unwrap();
        sub.link((0, 0, 0), Direction::Down);
        sub.get_by_name_mut("Hall").unwrap().block(Direction::Down);
        barrow.attach_sub_grid(sub).unwrap();

        grid.add_location(barrow, 0, 1).unwrap();
        grid.link(0, 0, Direction::North);
        grid.get_by_name_mut("Crossroads")
            .unwrap()
            .connect(Direction::East, "Unexplored east of Crossroads");
        grid
    }

    #[test]
    fn test_world_survives_save_and_load() {
        let grid = sample_world();
        let json = world_to_json(&grid).unwrap();
        let loaded = world_from_json(&json).unwrap().into_grid().unwrap();
        assert_eq!(loaded, grid);
        assert!(loaded.indices_consistent());
        let sub = loaded.get_by_name("Barrow").unwrap().sub_grid().unwrap();
        assert!(!sub.get_by_name("Hall").unwrap().is_passable(Direction::Down));
    }

    #[test]
    fn test_saved_shape() {
        let json = world_to_json(&sample_world()).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        let barrow = &value[1];
        assert_eq!(barrow["name"], "Barrow");
        assert_eq!(barrow["coordinates"], serde_json::json!([0, 1]));
        assert_eq!(barrow["sub_grid"]["parent_name"], "Barrow");
        assert_eq!(barrow["sub_grid"]["bounds"], serde_json::json!([-3, 3, -3, 3, -2, 0]));
        assert_eq!(
            barrow["sub_grid"]["locations"][1]["coordinates"],
            serde_json::json!([0, 0, -1])
        );
    }

    #[test]
    fn test_legacy_four_int_bounds() {
        let json = r#"[
            {"name": "Hamlet", "category": "village", "coordinates": [2, 3],
             "sub_grid": {"parent_name": "Hamlet", "bounds": [-1, 1, -1, 1],
                          "locations": [{"name": "Green", "coordinates": [0, 0]}]}}
        ]"#;
        let grid = world_from_json(json).unwrap().into_grid().unwrap();
        let sub = grid.get_by_name("Hamlet").unwrap().sub_grid().unwrap();
        assert_eq!(sub.bounds(), SubGridBounds::flat(-1, 1, -1, 1));
        assert_eq!(
            sub.get_by_name("Green").unwrap().coordinates(),
            Some(Coordinates::Interior(0, 0, 0))
        );
    }

    #[test]
    fn test_legacy_name_map_is_ungridded() {
        let json = r#"{
            "Old Mill": {"description": "Creaking sails", "connections": {"north": "Mill Pond"}},
            "Mill Pond": {"name": "Mill Pond", "category": "plains"}
        }"#;
        let LoadedWorld::Ungridded(locations) = world_from_json(json).unwrap() else {
            panic!("expected an un-gridded world");
        };
        assert_eq!(locations.len(), 2);
        let mill = &locations["Old Mill"];
        assert_eq!(mill.name(), "Old Mill");
        assert!(mill.coordinates().is_none());
        assert_eq!(mill.connection(Direction::North), Some("Mill Pond"));
    }

    #[test]
    fn test_rejects_bad_worlds() {
        assert!(matches!(
            world_from_json("42"),
            Err(SaveError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            world_from_json(r#"[{"name": "Nowhere"}]"#),
            Err(SaveError::UnsupportedFormat(_))
        ));
        let clash = r#"[{"name": "Aa", "coordinates": [0, 0]}, {"name": "Bb", "coordinates": [0, 0]}]"#;
        assert!(matches!(
            world_from_json(clash),
            Err(SaveError::Grid(GridError::OccupiedCoordinate(_)))
        ));
        assert!(matches!(world_from_json("[{"), Err(SaveError::Json(_))));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.json");
        let grid = sample_world();
        save_world(&grid, &path).unwrap();
        assert_eq!(load_world(&path).unwrap(), LoadedWorld::Gridded(grid));
        assert!(matches!(
            load_world(&dir.path().join("missing.json")),
            Err(SaveError::Io(_))
        ));
    }
}
