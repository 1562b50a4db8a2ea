//! Cellular automaton layout for caves
//!
//! Each level starts as random rock/open noise, is smoothed a fixed number
//! of times by counting rock neighbors, and then only the open blob
//! connected to the level's anchor survives. Survivors become rooms: cells
//! with three or more open sides are chambers, the rest are passages.

use std::collections::VecDeque;

use crate::rng::GameRng;
use crate::world::{Direction, SubGridBounds, step3};

use super::{
    CAVE_HAZARDS, LayoutBuilder, LayoutGenerator, RoomTemplate, RoomType, mark_boss,
    mark_dead_end_treasure, suggest_hazards,
};

/// Open/rock map for a single level, indexed from the bounds' corner.
struct CaveMap {
    min_x: i32,
    min_y: i32,
    width: i32,
    height: i32,
    open: Vec<bool>,
}

impl CaveMap {
    fn new(bounds: &SubGridBounds) -> Self {
        let width = bounds.width();
        let height = bounds.height();
        Self {
            min_x: bounds.min_x,
            min_y: bounds.min_y,
            width,
            height,
            open: vec![false; (width * height) as usize],
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let (lx, ly) = (x - self.min_x, y - self.min_y);
        if lx < 0 || ly < 0 || lx >= self.width || ly >= self.height {
            return None;
        }
        Some((ly * self.width + lx) as usize)
    }

    fn is_open(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some_and(|i| self.open[i])
    }

    fn set(&mut self, x: i32, y: i32, open: bool) {
        if let Some(i) = self.index(x, y) {
            self.open[i] = open;
        }
    }

    /// Rock among the 8 surrounding cells; off-map counts as rock.
    fn rock_neighbors(&self, x: i32, y: i32) -> u32 {
        let mut count = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if (dx, dy) != (0, 0) && !self.is_open(x + dx, y + dy) {
                    count += 1;
                }
            }
        }
        count
    }

    fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (0..self.height).flat_map(move |ly| (0..self.width).map(move |lx| (self.min_x + lx, self.min_y + ly)))
    }
}

#[derive(Debug, Clone)]
pub struct CellularGenerator {
    pub iterations: u32,
    /// Percent range the initial rock ratio is drawn from.
    pub min_fill: u32,
    pub max_fill: u32,
    pub treasure_chance: u32,
}

impl Default for CellularGenerator {
    fn default() -> Self {
        Self {
            iterations: 4,
            min_fill: 40,
            max_fill: 50,
            treasure_chance: 30,
        }
    }
}

impl CellularGenerator {
    fn grow_level(&self, bounds: &SubGridBounds, anchor: (i32, i32), rng: &mut GameRng) -> CaveMap {
        let mut map = CaveMap::new(bounds);
        let fill = rng.range_inclusive(self.min_fill as i32, self.max_fill as i32) as u32;
        let cells: Vec<(i32, i32)> = map.cells().collect();
        for &(x, y) in &cells {
            let open = !rng.percent(fill);
            map.set(x, y, open);
        }
        map.set(anchor.0, anchor.1, true);

        for _ in 0..self.iterations {
            let next: Vec<bool> = cells
                .iter()
                .map(|&(x, y)| match map.rock_neighbors(x, y) {
                    n if n > 4 => false,
                    n if n < 4 => true,
                    _ => map.is_open(x, y),
                })
                .collect();
            map.open = next;
            map.set(anchor.0, anchor.1, true);
        }
        map
    }

    /// Open cells 4-connected to `anchor`, in breadth-first order.
    fn surviving_blob(map: &CaveMap, anchor: (i32, i32)) -> Vec<(i32, i32)> {
        let mut seen = vec![false; map.open.len()];
        let mut blob = Vec::new();
        let mut queue = VecDeque::new();
        if let Some(i) = map.index(anchor.0, anchor.1) {
            seen[i] = true;
            queue.push_back(anchor);
        }
        while let Some((x, y)) = queue.pop_front() {
            blob.push((x, y));
            for dir in Direction::CARDINALS {
                let Some((nx, ny, _)) = step3((x, y, 0), dir) else {
                    continue;
                };
                if let Some(i) = map.index(nx, ny) {
                    if map.open[i] && !seen[i] {
                        seen[i] = true;
                        queue.push_back((nx, ny));
                    }
                }
            }
        }
        blob
    }

    /// A sealed anchor gets a short tunnel so every level has somewhere to go.
    fn tunnel_out(map: &mut CaveMap, anchor: (i32, i32), rng: &mut GameRng) {
        let mut at = anchor;
        for _ in 0..3 {
            let options: Vec<(i32, i32)> = Direction::CARDINALS
                .iter()
                .filter_map(|d| step3((at.0, at.1, 0), *d).map(|(x, y, _)| (x, y)))
                .filter(|(x, y)| map.index(*x, *y).is_some())
                .collect();
            let Some(&next) = rng.choose(&options) else {
                return;
            };
            map.set(next.0, next.1, true);
            at = next;
        }
    }
}

impl LayoutGenerator for CellularGenerator {
    fn generate(&self, bounds: &SubGridBounds, seed: u64) -> Vec<RoomTemplate> {
        let mut rng = GameRng::new(seed);
        let mut layout = LayoutBuilder::new(*bounds);
        let origin = bounds.clamp_origin();
        let ground = origin.2;
        layout.place(origin, RoomType::Entry);

        let mut blobs: Vec<(i32, Vec<(i32, i32)>)> = Vec::new();
        for z in bounds.levels_from_ground() {
            let parent_level = match z.cmp(&ground) {
                std::cmp::Ordering::Greater => Some(z - 1),
                std::cmp::Ordering::Less => Some(z + 1),
                std::cmp::Ordering::Equal => None,
            };
            let stair = match parent_level {
                None => None,
                Some(p) => {
                    let Some((_, upper)) = blobs.iter().find(|(level, _)| *level == p) else {
                        continue;
                    };
                    let pool: Vec<(i32, i32)> = upper
                        .iter()
                        .copied()
                        .filter(|c| (c.0, c.1, p) != origin)
                        .collect();
                    let pool = if pool.is_empty() { upper.clone() } else { pool };
                    rng.choose(&pool).map(|&(x, y)| (x, y, p))
                }
            };
            let anchor = stair.map_or((origin.0, origin.1), |s| (s.0, s.1));

            let mut map = self.grow_level(bounds, anchor, &mut rng);
            let mut blob = Self::surviving_blob(&map, anchor);
            if blob.len() < 2 {
                Self::tunnel_out(&mut map, anchor, &mut rng);
                blob = Self::surviving_blob(&map, anchor);
            }

            for &(x, y) in &blob {
                let open_sides = Direction::CARDINALS
                    .iter()
                    .filter(|d| {
                        step3((x, y, 0), **d).is_some_and(|(nx, ny, _)| blob.contains(&(nx, ny)))
                    })
                    .count();
                let room_type = if open_sides >= 3 {
                    RoomType::Chamber
                } else {
                    RoomType::Corridor
                };
                layout.place((x, y, z), room_type);
            }
            for &(x, y) in &blob {
                for dir in [Direction::North, Direction::East] {
                    if let Some(next) = step3((x, y, z), dir).filter(|c| layout.contains(*c)) {
                        layout.connect((x, y, z), next);
                    }
                }
            }
            if let Some(upper) = stair {
                layout.connect(upper, (anchor.0, anchor.1, z));
            }
            blobs.push((z, blob));
        }

        mark_boss(&mut layout, &[RoomType::Chamber, RoomType::Corridor]);
        mark_dead_end_treasure(&mut layout, &mut rng, self.treasure_chance);
        suggest_hazards(&mut layout, &mut rng, CAVE_HAZARDS, 10);

        tracing::debug!(rooms = layout.len(), seed, "Cave layout generated");
        layout.finish()
    }

    fn name(&self) -> &'static str {
        "cellular"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cave_bounds() -> SubGridBounds {
        SubGridBounds::new(-4, 4, -4, 4, -1, 0)
    }

    #[test]
    fn test_single_entry_at_ground() {
        for seed in 0..10 {
            let rooms = CellularGenerator::default().generate(&cave_bounds(), seed);
            let entries: Vec<_> = rooms.iter().filter(|r| r.is_entry).collect();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].coords, (0, 0, 0));
        }
    }

    #[test]
    fn test_deterministic() {
        let generator = CellularGenerator::default();
        let a = generator.generate(&cave_bounds(), 5);
        assert_eq!(a, generator.generate(&cave_bounds(), 5));
        assert_ne!(a, generator.generate(&cave_bounds(), 6));
    }

    #[test]
    fn test_every_room_connected() {
        for seed in 0..10 {
            let rooms = CellularGenerator::default().generate(&cave_bounds(), seed);
            assert!(rooms.len() >= 2, "seed {} produced a sealed cave", seed);
            assert!(rooms.iter().all(|r| !r.connections.is_empty()));
        }
    }

    #[test]
    fn test_lower_level_shares_stair_column() {
        for seed in 0..10 {
            let rooms = CellularGenerator::default().generate(&cave_bounds(), seed);
            let lower: Vec<_> = rooms.iter().filter(|r| r.coords.2 == -1).collect();
            if lower.is_empty() {
                continue;
            }
            assert!(lower.iter().any(|r| {
                r.connections.contains(&Direction::Up)
                    && rooms.iter().any(|u| u.coords == (r.coords.0, r.coords.1, 0))
            }));
        }
    }

    #[test]
    fn test_smoothing_closes_isolated_rock() {
        let bounds = SubGridBounds::new(-2, 2, -2, 2, 0, 0);
        let mut map = CaveMap::new(&bounds);
        for (x, y) in map.cells().collect::<Vec<_>>() {
            map.set(x, y, true);
        }
        map.set(0, 0, false);
        assert_eq!(map.rock_neighbors(1, 1), 1);
        assert_eq!(map.rock_neighbors(-2, -2), 5);
    }
}
