//! Vertical layout for towers
//!
//! One stairwell room per floor from the ground up to `max_z`, all stacked
//! on the same (x, y) so consecutive floors always share a column. The
//! ground floor is the entry and the top floor the boss room.
//!
//! Column floors are linked up and down, so none of them is ever a dead
//! end. The tower's dead-end floors are its side alcoves: a floor below the
//! top may sprout one, reachable only from its column room, and each alcove
//! becomes a treasure room with `treasure_chance` percent probability.

use crate::rng::GameRng;
use crate::world::{Direction, SubGridBounds, step3};

use super::{
    LayoutBuilder, LayoutGenerator, RoomTemplate, RoomType, TOWER_HAZARDS, suggest_hazards,
};

#[derive(Debug, Clone)]
pub struct TowerGenerator {
    pub treasure_chance: u32,
    /// Percent chance a non-top floor gets a side alcove at all.
    pub alcove_chance: u32,
}

impl Default for TowerGenerator {
    fn default() -> Self {
        Self {
            treasure_chance: crate::consts::TOWER_TREASURE_CHANCE,
            alcove_chance: 60,
        }
    }
}

impl TowerGenerator {
    pub fn with_treasure_chance(treasure_chance: u32) -> Self {
        Self {
            treasure_chance,
            ..Self::default()
        }
    }
}

impl LayoutGenerator for TowerGenerator {
    fn generate(&self, bounds: &SubGridBounds, seed: u64) -> Vec<RoomTemplate> {
        let mut rng = GameRng::new(seed);
        let mut layout = LayoutBuilder::new(*bounds);
        let origin = bounds.clamp_origin();
        let (x, y, ground) = origin;
        let top = bounds.max_z.max(ground);

        layout.place(origin, RoomType::Entry);
        for z in (ground + 1)..=top {
            let room_type = if z == top {
                RoomType::BossRoom
            } else {
                RoomType::Chamber
            };
            layout.place((x, y, z), room_type);
            layout.connect((x, y, z - 1), (x, y, z));
        }

        for z in ground..top {
            if !rng.percent(self.alcove_chance) {
                continue;
            }
            let sides: Vec<(i32, i32, i32)> = Direction::CARDINALS
                .iter()
                .filter_map(|d| step3((x, y, z), *d))
                .filter(|c| bounds.contains(*c))
                .collect();
            let Some(&alcove) = rng.choose(&sides) else {
                continue;
            };
            let room_type = if rng.percent(self.treasure_chance) {
                RoomType::Treasure
            } else {
                RoomType::Chamber
            };
            layout.place(alcove, room_type);
            layout.connect((x, y, z), alcove);
        }

        // A single-storey tower keeps its boss beside the entry.
        if top == ground {
            let sides: Vec<(i32, i32, i32)> = Direction::CARDINALS
                .iter()
                .filter_map(|d| step3(origin, *d))
                .filter(|c| bounds.contains(*c) && !layout.contains(*c))
                .collect();
            if let Some(&lair) = rng.choose(&sides) {
                layout.place(lair, RoomType::BossRoom);
                layout.connect(origin, lair);
            }
        }

        suggest_hazards(&mut layout, &mut rng, TOWER_HAZARDS, 10);
        tracing::debug!(rooms = layout.len(), seed, "Tower layout generated");
        layout.finish()
    }

    fn name(&self) -> &'static str {
        "tower"
    }
}
