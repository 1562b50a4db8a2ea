//! Binary space partition layout for dungeons
//!
//! Each z-level's rectangle is split recursively; every leaf gets one
//! chamber and sibling subtrees are joined by L-shaped corridors. The leaf
//! holding the level's anchor (the local origin on the ground level, the
//! stair position below it) puts its chamber exactly on the anchor, so
//! consecutive levels always share an (x, y).

use std::collections::BTreeMap;

use crate::rng::GameRng;
use crate::world::SubGridBounds;

use super::{
    DUNGEON_HAZARDS, LayoutBuilder, LayoutGenerator, RoomTemplate, RoomType, mark_boss,
    mark_dead_end_treasure, suggest_hazards,
};

/// Axis-aligned inclusive cell rectangle on one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rect {
    lx: i32,
    ly: i32,
    hx: i32,
    hy: i32,
}

impl Rect {
    fn width(&self) -> i32 {
        self.hx - self.lx + 1
    }

    fn height(&self) -> i32 {
        self.hy - self.ly + 1
    }

    fn contains(&self, (x, y): (i32, i32)) -> bool {
        (self.lx..=self.hx).contains(&x) && (self.ly..=self.hy).contains(&y)
    }
}

#[derive(Debug)]
enum Node {
    Leaf(Rect),
    Split(Box<Node>, Box<Node>),
}

#[derive(Debug, Clone)]
pub struct BspGenerator {
    /// Smallest leaf edge, in cells.
    pub min_leaf: i32,
    pub max_depth: u32,
    /// Percent chance a dead-end room is turned into treasure.
    pub treasure_chance: u32,
    /// Percent chance one chamber per level becomes a puzzle room.
    pub puzzle_chance: u32,
}

impl Default for BspGenerator {
    fn default() -> Self {
        Self {
            min_leaf: 2,
            max_depth: 4,
            treasure_chance: 30,
            puzzle_chance: 40,
        }
    }
}

impl BspGenerator {
    fn split(&self, rect: Rect, depth: u32, rng: &mut GameRng) -> Node {
        let can_split_x = rect.width() >= 2 * self.min_leaf;
        let can_split_y = rect.height() >= 2 * self.min_leaf;
        if depth >= self.max_depth || !(can_split_x || can_split_y) {
            return Node::Leaf(rect);
        }
        // Deeper nodes stop early sometimes so leaf sizes vary.
        if depth >= 2 && rng.one_in(3) {
            return Node::Leaf(rect);
        }

        let vertical_cut = match (can_split_x, can_split_y) {
            (true, false) => true,
            (false, true) => false,
            _ if rect.width() > rect.height() => true,
            _ if rect.height() > rect.width() => false,
            _ => rng.one_in(2),
        };

        if vertical_cut {
            let cut = rng.range_inclusive(rect.lx + self.min_leaf - 1, rect.hx - self.min_leaf);
            let left = Rect { hx: cut, ..rect };
            let right = Rect { lx: cut + 1, ..rect };
            Node::Split(
                Box::new(self.split(left, depth + 1, rng)),
                Box::new(self.split(right, depth + 1, rng)),
            )
        } else {
            let cut = rng.range_inclusive(rect.ly + self.min_leaf - 1, rect.hy - self.min_leaf);
            let bottom = Rect { hy: cut, ..rect };
            let top = Rect { ly: cut + 1, ..rect };
            Node::Split(
                Box::new(self.split(bottom, depth + 1, rng)),
                Box::new(self.split(top, depth + 1, rng)),
            )
        }
    }

    /// Carve chambers for every leaf under `node` and join siblings.
    /// Returns one chamber of the subtree to link against.
    fn carve(
        node: &Node,
        z: i32,
        anchor: (i32, i32),
        layout: &mut LayoutBuilder,
        chambers: &mut Vec<(i32, i32, i32)>,
        rng: &mut GameRng,
    ) -> (i32, i32, i32) {
        match node {
            Node::Leaf(rect) => {
                let (x, y) = if rect.contains(anchor) {
                    anchor
                } else {
                    (
                        rng.range_inclusive(rect.lx, rect.hx),
                        rng.range_inclusive(rect.ly, rect.hy),
                    )
                };
                let coords = (x, y, z);
                layout.place(coords, RoomType::Chamber);
                chambers.push(coords);
                coords
            }
            Node::Split(a, b) => {
                let left = Self::carve(a, z, anchor, layout, chambers, rng);
                let right = Self::carve(b, z, anchor, layout, chambers, rng);
                layout.carve_corridor(left, right);
                if rng.one_in(2) { left } else { right }
            }
        }
    }
}

impl LayoutGenerator for BspGenerator {
    fn generate(&self, bounds: &SubGridBounds, seed: u64) -> Vec<RoomTemplate> {
        let mut rng = GameRng::new(seed);
        let mut layout = LayoutBuilder::new(*bounds);
        let origin = bounds.clamp_origin();
        let ground = origin.2;
        layout.place(origin, RoomType::Entry);

        let root = Rect {
            lx: bounds.min_x,
            ly: bounds.min_y,
            hx: bounds.max_x,
            hy: bounds.max_y,
        };
        let mut chambers_by_level: BTreeMap<i32, Vec<(i32, i32, i32)>> = BTreeMap::new();

        for z in bounds.levels_from_ground() {
            let parent_level = match z.cmp(&ground) {
                std::cmp::Ordering::Greater => Some(z - 1),
                std::cmp::Ordering::Less => Some(z + 1),
                std::cmp::Ordering::Equal => None,
            };

            // Stairs come down from a chamber on the parent level.
            let stair_from = parent_level.and_then(|p| {
                let candidates: Vec<(i32, i32, i32)> = chambers_by_level
                    .get(&p)
                    .map(|cs| cs.iter().copied().filter(|c| *c != origin).collect())
                    .unwrap_or_default();
                let pool = if candidates.is_empty() {
                    chambers_by_level.get(&p).cloned().unwrap_or_default()
                } else {
                    candidates
                };
                rng.choose(&pool).copied()
            });
            if parent_level.is_some() && stair_from.is_none() {
                continue;
            }
            let anchor = stair_from.map_or((origin.0, origin.1), |c| (c.0, c.1));

            let tree = self.split(root, 0, &mut rng);
            let mut chambers = Vec::new();
            Self::carve(&tree, z, anchor, &mut layout, &mut chambers, &mut rng);

            if let Some(upper) = stair_from {
                layout.connect(upper, (anchor.0, anchor.1, z));
            }

            if rng.percent(self.puzzle_chance) {
                let pickable: Vec<_> = chambers
                    .iter()
                    .copied()
                    .filter(|c| layout.room_type(*c) == Some(RoomType::Chamber))
                    .collect();
                if let Some(&puzzle) = rng.choose(&pickable) {
                    layout.set_type(puzzle, RoomType::Puzzle);
                }
            }
            chambers_by_level.insert(z, chambers);
        }

        mark_boss(&mut layout, &[RoomType::Chamber, RoomType::Puzzle]);
        mark_dead_end_treasure(&mut layout, &mut rng, self.treasure_chance);
        suggest_hazards(&mut layout, &mut rng, DUNGEON_HAZARDS, 15);

        tracing::debug!(rooms = layout.len(), seed, "BSP layout generated");
        layout.finish()
    }

    fn name(&self) -> &'static str {
        "bsp"
    }
}
