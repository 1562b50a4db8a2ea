//! Room layout generation
//!
//! Pure, seeded generators that turn interior bounds into room blueprints.
//! Each algorithm lives in its own module behind the `LayoutGenerator`
//! trait; they share nothing but that contract and the `LayoutBuilder`
//! bookkeeping. Templates only become `Location`s in the reconciler.

mod bsp;
mod cellular;
mod layout;
mod settlement;
mod tower;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::rng::GameRng;
use crate::world::{Category, Direction, SubGridBounds};

pub use bsp::BspGenerator;
pub use cellular::CellularGenerator;
pub use layout::LayoutBuilder;
pub use settlement::SettlementGenerator;
pub use tower::TowerGenerator;

/// Role of a generated room.
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
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RoomType {
    Entry,
    Corridor,
    Chamber,
    BossRoom,
    Treasure,
    Puzzle,
}

/// One generated room. Transient: converted to a `Location` by the
/// reconciler and never stored itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomTemplate {
    pub coords: (i32, i32, i32),
    pub room_type: RoomType,
    pub connections: Vec<Direction>,
    pub is_entry: bool,
    pub suggested_hazards: Vec<String>,
}

impl RoomTemplate {
    pub fn new(coords: (i32, i32, i32), room_type: RoomType) -> Self {
        Self {
            coords,
            room_type,
            connections: Vec::new(),
            is_entry: room_type == RoomType::Entry,
            suggested_hazards: Vec::new(),
        }
    }
}

/// Shared contract of every layout algorithm: identical `(bounds, seed)`
/// yields identical output.
pub trait LayoutGenerator {
    fn generate(&self, bounds: &SubGridBounds, seed: u64) -> Vec<RoomTemplate>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Pick the generator for a category; `None` for open-air categories that
/// have no interior.
pub fn generator_for(category: &Category) -> Option<Box<dyn LayoutGenerator>> {
    match category {
        Category::Dungeon | Category::Ruins | Category::Temple => {
            Some(Box::new(BspGenerator::default()))
        }
        Category::Cave => Some(Box::new(CellularGenerator::default())),
        Category::Town | Category::Village | Category::City => {
            Some(Box::new(SettlementGenerator::default()))
        }
        Category::Tower => Some(Box::new(TowerGenerator::default())),
        _ => None,
    }
}

/// Hazards a generator may suggest, by flavour.
pub(crate) const DUNGEON_HAZARDS: &[&str] = &[
    "spike trap",
    "poison dart",
    "collapsing floor",
    "cursed glyph",
];

pub(crate) const CAVE_HAZARDS: &[&str] = &[
    "falling rocks",
    "flooded passage",
    "bat swarm",
    "slick stone",
];

pub(crate) const TOWER_HAZARDS: &[&str] = &["arcane ward", "crumbling stair", "gargoyle"];

pub(crate) const SETTLEMENT_HAZARDS: &[&str] = &["pickpocket", "stray dogs"];

/// Sprinkle hazards over non-entry rooms, more often further from ground.
pub(crate) fn suggest_hazards(
    layout: &mut LayoutBuilder,
    rng: &mut GameRng,
    table: &[&str],
    base_chance: u32,
) {
    for coords in layout.coords() {
        if layout.room_type(coords) == Some(RoomType::Entry) {
            continue;
        }
        let chance = base_chance + 10 * coords.2.unsigned_abs();
        if rng.percent(chance.min(90)) {
            if let Some(hazard) = rng.choose(table) {
                layout.add_hazard(coords, hazard);
            }
        }
    }
}

/// Mark the boss room: greatest |z|, then furthest (Manhattan) from the entry.
/// Only rooms whose type is in `candidates` are considered.
pub(crate) fn mark_boss(layout: &mut LayoutBuilder, candidates: &[RoomType]) -> Option<(i32, i32, i32)> {
    let entry = layout.entry()?;
    let boss = layout
        .coords()
        .into_iter()
        .filter(|c| *c != entry)
        .filter(|c| layout.room_type(*c).is_some_and(|t| candidates.contains(&t)))
        .max_by_key(|c| (c.2.unsigned_abs(), manhattan(*c, entry)))?;
    layout.set_type(boss, RoomType::BossRoom);
    Some(boss)
}

/// Turn some dead-end rooms into treasure rooms.
pub(crate) fn mark_dead_end_treasure(layout: &mut LayoutBuilder, rng: &mut GameRng, chance: u32) {
    for coords in layout.coords() {
        let eligible = matches!(
            layout.room_type(coords),
            Some(RoomType::Chamber) | Some(RoomType::Corridor)
        );
        if eligible && layout.degree(coords) == 1 && rng.percent(chance) {
            layout.set_type(coords, RoomType::Treasure);
        }
    }
}

/// Manhattan distance over all three axes.
pub fn manhattan(a: (i32, i32, i32), b: (i32, i32, i32)) -> u32 {
    a.0.abs_diff(b.0) + a.1.abs_diff(b.1) + a.2.abs_diff(b.2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_type_names() {
        assert_eq!(RoomType::BossRoom.to_string(), "boss_room");
        assert_eq!("treasure".parse::<RoomType>().unwrap(), RoomType::Treasure);
        assert_eq!(
            serde_json::to_string(&RoomType::BossRoom).unwrap(),
            "\"boss_room\""
        );
    }

    #[test]
    fn test_generator_for_category() {
        assert_eq!(generator_for(&Category::Dungeon).unwrap().name(), "bsp");
        assert_eq!(generator_for(&Category::Temple).unwrap().name(), "bsp");
        assert_eq!(generator_for(&Category::Cave).unwrap().name(), "cellular");
        assert_eq!(generator_for(&Category::City).unwrap().name(), "settlement");
        assert_eq!(generator_for(&Category::Tower).unwrap().name(), "tower");
        assert!(generator_for(&Category::Plains).is_none());
    }

    #[test]
    fn test_manhattan() {
        assert_eq!(manhattan((0, 0, 0), (2, -3, -1)), 6);
    }
}
