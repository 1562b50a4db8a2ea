//! Depth scaling for freshly populated interiors
//!
//! Everything here is keyed on a room's depth score: horizontal Manhattan
//! distance from the exit point plus the absolute z-level. Deeper rooms get
//! the boss, harder locks, better hidden secrets and more danger.

use serde::Serialize;

use crate::config::WorldOptions;
use crate::generation::{RoomType, manhattan};
use crate::rng::GameRng;
use crate::world::{Secret, SubGrid, Treasure};

/// What the depth pass placed, for logging and callers that narrate it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlacementReport {
    pub boss: Option<String>,
    /// Room name and lock difficulty, in placement order.
    pub chests: Vec<(String, u32)>,
    pub key: Option<KeyPlacement>,
    pub secrets: Vec<String>,
}

/// The boss door's key and where it was left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyPlacement {
    pub key_id: String,
    pub door: String,
    pub room: String,
}

/// `|dx| + |dy|` from `reference` plus `|z|`.
pub fn depth_score(coords: (i32, i32, i32), reference: (i32, i32, i32)) -> u32 {
    coords.0.abs_diff(reference.0) + coords.1.abs_diff(reference.1) + coords.2.unsigned_abs()
}

/// Chests for `eligible` rooms: `min(max, ceil(eligible / 2))`.
pub fn treasure_count(eligible: usize, max: usize) -> usize {
    eligible.div_ceil(2).min(max)
}

pub fn lock_difficulty(score: u32, options: &WorldOptions) -> u32 {
    options
        .lock_difficulty_base
        .saturating_add(options.lock_difficulty_step.saturating_mul(score))
        .min(options.lock_difficulty_cap)
}

pub fn secret_threshold(score: u32, options: &WorldOptions) -> u32 {
    options
        .secret_threshold_base
        .saturating_add(options.secret_threshold_step.saturating_mul(score))
}

pub fn danger_level(score: u32) -> u32 {
    1 + score / 2
}

struct Room {
    name: String,
    coords: (i32, i32, i32),
    score: u32,
    suggested_treasure: bool,
    dead_end: bool,
}

/// Place boss, chests, the boss key and secrets in `sub`, and set every
/// room's danger level. `entry` is the exit-point room all distances are
/// measured from; it never receives the boss, a chest or a secret.
pub fn apply_depth_scaling(
    sub: &mut SubGrid,
    entry: &str,
    rng: &mut GameRng,
    options: &WorldOptions,
) -> PlacementReport {
    let mut report = PlacementReport::default();
    let Some(reference) = sub.coordinates_of(entry) else {
        tracing::warn!(entry, "Depth pass skipped: entry room not in interior");
        return report;
    };

    let rooms: Vec<Room> = sub
        .iter()
        .map(|(coords, loc)| Room {
            name: loc.name().to_string(),
            coords,
            score: depth_score(coords, reference),
            suggested_treasure: loc.room_type == Some(RoomType::Treasure),
            dead_end: loc.connections.len() == 1,
        })
        .collect();

    for room in &rooms {
        if let Some(loc) = sub.get_by_name_mut(&room.name) {
            loc.danger_level = danger_level(room.score);
        }
    }

    // Boss: deepest level below or highest above ground, then furthest from
    // the entry.
    let boss = rooms
        .iter()
        .filter(|r| r.name != entry)
        .max_by_key(|r| (r.coords.2.unsigned_abs(), manhattan(r.coords, reference)));
    for room in &rooms {
        let is_boss = boss.is_some_and(|b| b.name == room.name);
        if let Some(loc) = sub.get_by_name_mut(&room.name) {
            if is_boss {
                loc.room_type = Some(RoomType::BossRoom);
            } else if loc.room_type == Some(RoomType::BossRoom) {
                loc.room_type = Some(RoomType::Chamber);
            }
        }
    }
    report.boss = boss.map(|b| b.name.clone());

    // Chests: rooms the layout already marked as vaults go first.
    let mut marked: Vec<&Room> = Vec::new();
    let mut unmarked: Vec<&Room> = Vec::new();
    for room in rooms.iter().filter(|r| {
        r.name != entry && boss.is_none_or(|b| b.name != r.name)
    }) {
        if room.suggested_treasure {
            marked.push(room);
        } else {
            unmarked.push(room);
        }
    }
    let eligible = marked.len() + unmarked.len();
    rng.shuffle(&mut marked);
    rng.shuffle(&mut unmarked);
    let count = treasure_count(eligible, options.max_treasure_chests);
    for room in marked.into_iter().chain(unmarked).take(count) {
        let difficulty = lock_difficulty(room.score, options);
        if let Some(loc) = sub.get_by_name_mut(&room.name) {
            loc.treasure = Some(Treasure {
                lock_difficulty: difficulty,
                looted: false,
            });
        }
        report.chests.push((room.name.clone(), difficulty));
    }

    // The boss door is locked; its key lies strictly closer to the entry.
    if let Some(boss) = boss {
        let closer: Vec<&Room> = rooms
            .iter()
            .filter(|r| r.name != boss.name && r.score < boss.score)
            .collect();
        let key_room = rng
            .choose(&closer)
            .map(|r| r.name.clone())
            .unwrap_or_else(|| entry.to_string());
        let key_id = format!("key:{}", boss.name);
        if let Some(loc) = sub.get_by_name_mut(&boss.name) {
            loc.locked_by = Some(key_id.clone());
        }
        if let Some(loc) = sub.get_by_name_mut(&key_room) {
            loc.keys.push(key_id.clone());
        }
        report.key = Some(KeyPlacement {
            key_id,
            door: boss.name.clone(),
            room: key_room,
        });
    }

    for room in rooms.iter().filter(|r| r.dead_end && r.name != entry) {
        if boss.is_some_and(|b| b.name == room.name) {
            continue;
        }
        let threshold = secret_threshold(room.score, options);
        if let Some(loc) = sub.get_by_name_mut(&room.name) {
            loc.secret = Some(Secret {
                threshold,
                discovered: false,
            });
        }
        report.secrets.push(room.name.clone());
    }

    tracing::debug!(
        boss = ?report.boss,
        chests = report.chests.len(),
        secrets = report.secrets.len(),
        "Depth scaling applied"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Category, Direction, Location};

    /// Entry at the origin, a corridor running east, and a stair down from
    /// its far end.
    fn sample() -> SubGrid {
        let mut sub = SubGrid::for_category("Barrow", &Category::Dungeon);
        let rooms = [
            ("Gate", (0, 0, 0)),
            ("Hall", (1, 0, 0)),
            ("Gallery", (2, 0, 0)),
            ("Crypt", (2, 0, -1)),
            ("Ossuary", (3, 0, -1)),
        ];
        for (name, (x, y, z)) in rooms {
            sub.add_location(Location::new(name, Category::Dungeon), x, y, z)
                .unwrap();
        }
        sub.link((0, 0, 0), Direction::East);
        sub.link((1, 0, 0), Direction::East);
        sub.link((2, 0, 0), Direction::Down);
        sub.link((2, 0, -1), Direction::East);
        sub
    }

    #[test]
    fn test_scores_and_counts() {
        assert_eq!(depth_score((2, -1, -2), (0, 0, 0)), 5);
        assert_eq!(depth_score((1, 0, -1), (1, 0, 0)), 1);
        assert_eq!(treasure_count(0, 3), 0);
        assert_eq!(treasure_count(1, 3), 1);
        assert_eq!(treasure_count(5, 3), 3);
        assert_eq!(treasure_count(9, 3), 3);
        assert_eq!(danger_level(0), 1);
        assert_eq!(danger_level(5), 3);
    }

    #[test]
    fn test_lock_difficulty_monotonic_and_capped() {
        let options = WorldOptions::default();
        let mut last = 0;
        for score in 0..40 {
            let d = lock_difficulty(score, &options);
            assert!(d >= last);
            assert!(d <= options.lock_difficulty_cap);
            last = d;
        }
    }

    #[test]
    fn test_boss_is_deepest_and_furthest() {
        let mut sub = sample();
        let report =
            apply_depth_scaling(&mut sub, "Gate", &mut GameRng::new(1), &WorldOptions::default());
        assert_eq!(report.boss.as_deref(), Some("Ossuary"));
        let boss = sub.get_by_name("Ossuary").unwrap();
        assert_eq!(boss.room_type, Some(RoomType::BossRoom));
        assert_eq!(boss.locked_by.as_deref(), Some("key:Ossuary"));
    }

    #[test]
    fn test_tower_boss_stays_on_top() {
        let mut sub = SubGrid::for_category("Spire", &Category::Tower);
        for z in 0..=4 {
            sub.add_location(Location::new(format!("Floor {}", z), Category::Tower), 0, 0, z)
                .unwrap();
        }
        sub.add_location(Location::new("Landing", Category::Tower), 1, 0, 2)
            .unwrap();
        for z in 0..4 {
            sub.link((0, 0, z), Direction::Up);
        }
        sub.link((0, 0, 2), Direction::East);
        let report =
            apply_depth_scaling(&mut sub, "Floor 0", &mut GameRng::new(4), &WorldOptions::default());
        assert_eq!(report.boss.as_deref(), Some("Floor 4"));
        assert_eq!(report.key.unwrap().door, "Floor 4");
    }

    #[test]
    fn test_chests_spread_over_distinct_rooms() {
        let mut sub = sample();
        let report =
            apply_depth_scaling(&mut sub, "Gate", &mut GameRng::new(9), &WorldOptions::default());
        // Hall, Gallery and Crypt are eligible: ceil(3 / 2) = 2.
        assert_eq!(report.chests.len(), 2);
        assert_ne!(report.chests[0].0, report.chests[1].0);
        for (room, difficulty) in &report.chests {
            assert!(room != "Gate" && room != "Ossuary");
            let coords = sub.coordinates_of(room).unwrap();
            let expected = lock_difficulty(depth_score(coords, (0, 0, 0)), &WorldOptions::default());
            assert_eq!(*difficulty, expected);
        }
    }

    #[test]
    fn test_key_is_closer_than_boss_door() {
        for seed in 0..10 {
            let mut sub = sample();
            let report =
                apply_depth_scaling(&mut sub, "Gate", &mut GameRng::new(seed), &WorldOptions::default());
            let key = report.key.unwrap();
            let key_coords = sub.coordinates_of(&key.room).unwrap();
            let door_coords = sub.coordinates_of(&key.door).unwrap();
            assert!(depth_score(key_coords, (0, 0, 0)) < depth_score(door_coords, (0, 0, 0)));
            assert!(sub.get_by_name(&key.room).unwrap().keys.contains(&key.key_id));
        }
    }

    #[test]
    fn test_key_falls_back_to_entry() {
        let mut sub = SubGrid::for_category("Shrine", &Category::Temple);
        sub.add_location(Location::new("Porch", Category::Temple), 0, 0, 0)
            .unwrap();
        sub.add_location(Location::new("Sanctum", Category::Temple), 0, 1, 0)
            .unwrap();
        sub.link((0, 0, 0), Direction::North);
        let report =
            apply_depth_scaling(&mut sub, "Porch", &mut GameRng::new(2), &WorldOptions::default());
        assert_eq!(report.boss.as_deref(), Some("Sanctum"));
        assert_eq!(report.key.unwrap().room, "Porch");
        assert!(report.chests.is_empty());
    }

    #[test]
    fn test_secrets_and_danger() {
        let mut sub = sample();
        let options = WorldOptions::default();
        apply_depth_scaling(&mut sub, "Gate", &mut GameRng::new(4), &options);
        // Gate is a dead end but never hides a secret; Ossuary is the boss.
        assert!(sub.get_by_name("Gate").unwrap().secret.is_none());
        assert!(sub.get_by_name("Ossuary").unwrap().secret.is_none());
        assert!(sub.get_by_name("Hall").unwrap().secret.is_none());
        assert_eq!(sub.get_by_name("Gate").unwrap().danger_level, 1);
        assert_eq!(sub.get_by_name("Ossuary").unwrap().danger_level, danger_level(4));
    }

    #[test]
    fn test_single_boss_after_pass() {
        let mut sub = sample();
        sub.get_by_name_mut("Hall").unwrap().room_type = Some(RoomType::BossRoom);
        apply_depth_scaling(&mut sub, "Gate", &mut GameRng::new(3), &WorldOptions::default());
        let bosses = sub
            .iter()
            .filter(|(_, l)| l.room_type == Some(RoomType::BossRoom))
            .count();
        assert_eq!(bosses, 1);
        assert_eq!(sub.get_by_name("Hall").unwrap().room_type, Some(RoomType::Chamber));
    }
}
