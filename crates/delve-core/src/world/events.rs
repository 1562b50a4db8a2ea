//! Interior events: cave-ins and rival parties
//!
//! These run synchronously from the turn loop and only touch the interior
//! they are handed.

use std::collections::BTreeSet;

use crate::rng::GameRng;

use super::direction::Direction;
use super::subgrid::SubGrid;

/// Block the passage leaving `room` toward `direction`, on both sides.
/// Returns false if there is no such passage or it is already blocked.
pub fn collapse_passage(sub: &mut SubGrid, room: &str, direction: Direction) -> bool {
    let Some(target) = sub
        .get_by_name(room)
        .and_then(|loc| loc.connection(direction))
        .map(str::to_string)
    else {
        return false;
    };
    let blocked = sub
        .get_by_name_mut(room)
        .is_some_and(|loc| loc.block(direction));
    if let Some(other) = sub.get_by_name_mut(&target) {
        if other.connection(direction.opposite()) == Some(room) {
            other.block(direction.opposite());
        }
    }
    if blocked {
        tracing::info!(room, %direction, "Passage collapsed");
    }
    blocked
}

/// Reopen a collapsed passage on both sides.
pub fn clear_passage(sub: &mut SubGrid, room: &str, direction: Direction) -> bool {
    let target = sub
        .get_by_name(room)
        .and_then(|loc| loc.connection(direction))
        .map(str::to_string);
    let cleared = sub
        .get_by_name_mut(room)
        .is_some_and(|loc| loc.unblock(direction));
    if let Some(target) = target {
        if let Some(other) = sub.get_by_name_mut(&target) {
            other.unblock(direction.opposite());
        }
    }
    if cleared {
        tracing::info!(room, %direction, "Passage cleared");
    }
    cleared
}

/// Collapse one random passage whose loss strands no room that the entry
/// can currently reach. Returns the room and direction blocked.
pub fn place_cave_in(sub: &mut SubGrid, rng: &mut GameRng) -> Option<(String, Direction)> {
    let exit = sub.entry()?.name().to_string();
    let reachable_before = sub.reachable_from(&exit);

    let mut candidates: Vec<(String, Direction)> = Vec::new();
    let mut seen: BTreeSet<(String, String)> = BTreeSet::new();
    for (_, loc) in sub.iter() {
        for (direction, target) in loc.open_connections() {
            if !sub.contains_name(target) {
                continue;
            }
            let pair = if loc.name() < target {
                (loc.name().to_string(), target.to_string())
            } else {
                (target.to_string(), loc.name().to_string())
            };
            if seen.insert(pair) {
                candidates.push((loc.name().to_string(), direction));
            }
        }
    }
    rng.shuffle(&mut candidates);

    for (room, direction) in candidates {
        if !collapse_passage(sub, &room, direction) {
            continue;
        }
        if sub.reachable_from(&exit) == reachable_before {
            return Some((room, direction));
        }
        clear_passage(sub, &room, direction);
    }
    None
}

/// A rival party moves into a random unoccupied room away from the exit.
/// Returns the room name.
pub fn rival_party_arrives(sub: &mut SubGrid, party: &str, rng: &mut GameRng) -> Option<String> {
    let candidates: Vec<String> = sub
        .iter()
        .map(|(_, loc)| loc)
        .filter(|loc| !loc.is_exit_point && loc.rival_party.is_none())
        .map(|loc| loc.name().to_string())
        .collect();
    let room = rng.choose(&candidates)?.clone();
    if let Some(loc) = sub.get_by_name_mut(&room) {
        loc.rival_party = Some(party.to_string());
    }
    tracing::info!(party, room = %room, "Rival party arrived");
    Some(room)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Category, Location};

    /// Three rooms in a line plus one hanging off the middle:
    /// A - B - C, B - D (north).
    fn sample() -> SubGrid {
        let mut sub = SubGrid::for_category("Mine", &Category::Cave);
        for (name, x, y) in [("Aa", 0, 0), ("Bb", 1, 0), ("Cc", 2, 0), ("Dd", 1, 1)] {
            let mut loc = Location::new(name, Category::Cave);
            loc.is_exit_point = name == "Aa";
            sub.add_location(loc, x, y, 0).unwrap();
        }
        sub.link((0, 0, 0), Direction::East);
        sub.link((1, 0, 0), Direction::East);
        sub.link((1, 0, 0), Direction::North);
        sub
    }

    #[test]
    fn test_collapse_and_clear_both_sides() {
        let mut sub = sample();
        assert!(collapse_passage(&mut sub, "Bb", Direction::East));
        assert!(!sub.get_by_name("Bb").unwrap().is_passable(Direction::East));
        assert!(!sub.get_by_name("Cc").unwrap().is_passable(Direction::West));
        assert!(!collapse_passage(&mut sub, "Bb", Direction::East));

        assert!(clear_passage(&mut sub, "Bb", Direction::East));
        assert!(sub.get_by_name("Cc").unwrap().is_passable(Direction::West));
    }

    #[test]
    fn test_collapse_missing_passage() {
        let mut sub = sample();
        assert!(!collapse_passage(&mut sub, "Aa", Direction::West));
        assert!(!collapse_passage(&mut sub, "Nowhere", Direction::West));
    }

    #[test]
    fn test_cave_in_on_a_tree_strands_nothing() {
        // Every passage in a tree is a bridge, so no cave-in is allowed.
        let mut sub = sample();
        let mut rng = GameRng::new(3);
        assert!(place_cave_in(&mut sub, &mut rng).is_none());
        assert_eq!(sub.reachable_from("Aa").len(), 4);
    }

    #[test]
    fn test_cave_in_on_a_loop() {
        let mut sub = sample();
        sub.add_location(Location::new("Ee", Category::Cave), 2, 1, 0)
            .unwrap();
        sub.link((1, 1, 0), Direction::East);
        sub.link((2, 1, 0), Direction::South);
        let mut rng = GameRng::new(3);
        let (room, _) = place_cave_in(&mut sub, &mut rng).unwrap();
        assert!(["Bb", "Cc", "Dd", "Ee"].contains(&room.as_str()));
        assert_eq!(sub.reachable_from("Aa").len(), 5);
    }

    #[test]
    fn test_rival_party_avoids_exit() {
        let mut sub = sample();
        let mut rng = GameRng::new(1);
        for _ in 0..3 {
            let room = rival_party_arrives(&mut sub, "Iron Fangs", &mut rng).unwrap();
            assert_ne!(room, "Aa");
        }
        assert!(rival_party_arrives(&mut sub, "Iron Fangs", &mut rng).is_none());
    }
}
