//! Template bookkeeping shared by the generators
//!
//! Keeps rooms in placement order, refuses cells outside the bounds, and
//! records every connection on both rooms so templates are always
//! directionally consistent.

use hashbrown::HashMap;

use crate::world::{Direction, SubGridBounds};

use super::{RoomTemplate, RoomType};

#[derive(Debug, Clone)]
pub struct LayoutBuilder {
    bounds: SubGridBounds,
    rooms: Vec<RoomTemplate>,
    index: HashMap<(i32, i32, i32), usize>,
}

impl LayoutBuilder {
    pub fn new(bounds: SubGridBounds) -> Self {
        Self {
            bounds,
            rooms: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Place a room, or upgrade an existing corridor to a richer type.
    /// Returns false when `coords` is out of bounds.
    pub fn place(&mut self, coords: (i32, i32, i32), room_type: RoomType) -> bool {
        if !self.bounds.contains(coords) {
            return false;
        }
        match self.index.get(&coords) {
            Some(&i) => {
                let existing = &mut self.rooms[i];
                if existing.room_type == RoomType::Corridor && room_type != RoomType::Corridor {
                    existing.room_type = room_type;
                    existing.is_entry = room_type == RoomType::Entry;
                }
            }
            None => {
                self.index.insert(coords, self.rooms.len());
                self.rooms.push(RoomTemplate::new(coords, room_type));
            }
        }
        true
    }

    pub fn contains(&self, coords: (i32, i32, i32)) -> bool {
        self.index.contains_key(&coords)
    }

    pub fn room_type(&self, coords: (i32, i32, i32)) -> Option<RoomType> {
        self.index.get(&coords).map(|&i| self.rooms[i].room_type)
    }

    /// Retype a room. The entry keeps its type.
    pub fn set_type(&mut self, coords: (i32, i32, i32), room_type: RoomType) {
        if let Some(&i) = self.index.get(&coords) {
            let room = &mut self.rooms[i];
            if !room.is_entry {
                room.room_type = room_type;
            }
        }
    }

    pub fn entry(&self) -> Option<(i32, i32, i32)> {
        self.rooms.iter().find(|r| r.is_entry).map(|r| r.coords)
    }

    /// Join two existing, orthogonally adjacent rooms.
    pub fn connect(&mut self, a: (i32, i32, i32), b: (i32, i32, i32)) -> bool {
        let Some(direction) = Direction::between(a, b) else {
            return false;
        };
        let (Some(&ia), Some(&ib)) = (self.index.get(&a), self.index.get(&b)) else {
            return false;
        };
        if !self.rooms[ia].connections.contains(&direction) {
            self.rooms[ia].connections.push(direction);
        }
        let back = direction.opposite();
        if !self.rooms[ib].connections.contains(&back) {
            self.rooms[ib].connections.push(back);
        }
        true
    }

    /// Dig an L-shaped corridor on one level, x first then y, joining every
    /// step. Existing rooms along the way are reused.
    pub fn carve_corridor(&mut self, from: (i32, i32, i32), to: (i32, i32, i32)) {
        let z = from.2;
        let mut current = from;
        self.place(current, RoomType::Corridor);
        while current.0 != to.0 {
            let next = (current.0 + (to.0 - current.0).signum(), current.1, z);
            self.place(next, RoomType::Corridor);
            self.connect(current, next);
            current = next;
        }
        while current.1 != to.1 {
            let next = (current.0, current.1 + (to.1 - current.1).signum(), z);
            self.place(next, RoomType::Corridor);
            self.connect(current, next);
            current = next;
        }
    }

    pub fn degree(&self, coords: (i32, i32, i32)) -> usize {
        self.index
            .get(&coords)
            .map(|&i| self.rooms[i].connections.len())
            .unwrap_or(0)
    }

    pub fn add_hazard(&mut self, coords: (i32, i32, i32), hazard: &str) {
        if let Some(&i) = self.index.get(&coords) {
            self.rooms[i].suggested_hazards.push(hazard.to_string());
        }
    }

    /// Coordinates of every room, in placement order.
    pub fn coords(&self) -> Vec<(i32, i32, i32)> {
        self.rooms.iter().map(|r| r.coords).collect()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Final templates: placement order, connections sorted.
    pub fn finish(mut self) -> Vec<RoomTemplate> {
        for room in &mut self.rooms {
            room.connections.sort();
        }
        self.rooms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> SubGridBounds {
        SubGridBounds::new(-2, 2, -2, 2, -1, 0)
    }

    #[test]
    fn test_place_refuses_out_of_bounds() {
        let mut layout = LayoutBuilder::new(bounds());
        assert!(!layout.place((3, 0, 0), RoomType::Chamber));
        assert!(layout.is_empty());
    }

    #[test]
    fn test_place_upgrades_corridor_only() {
        let mut layout = LayoutBuilder::new(bounds());
        layout.place((0, 0, 0), RoomType::Entry);
        layout.place((0, 0, 0), RoomType::Chamber);
        assert_eq!(layout.room_type((0, 0, 0)), Some(RoomType::Entry));

        layout.place((1, 0, 0), RoomType::Corridor);
        layout.place((1, 0, 0), RoomType::Chamber);
        assert_eq!(layout.room_type((1, 0, 0)), Some(RoomType::Chamber));
    }

    #[test]
    fn test_connect_is_two_way() {
        let mut layout = LayoutBuilder::new(bounds());
        layout.place((0, 0, 0), RoomType::Entry);
        layout.place((0, 0, -1), RoomType::Chamber);
        assert!(layout.connect((0, 0, 0), (0, 0, -1)));
        let rooms = layout.finish();
        assert_eq!(rooms[0].connections, vec![Direction::Down]);
        assert_eq!(rooms[1].connections, vec![Direction::Up]);
    }

    #[test]
    fn test_corridor_joins_endpoints() {
        let mut layout = LayoutBuilder::new(bounds());
        layout.place((-2, -2, 0), RoomType::Chamber);
        layout.place((2, 1, 0), RoomType::Chamber);
        layout.carve_corridor((-2, -2, 0), (2, 1, 0));
        // 4 steps east + 3 steps north + the start cell
        assert_eq!(layout.len(), 8);
        assert_eq!(layout.room_type((2, 1, 0)), Some(RoomType::Chamber));
        assert_eq!(layout.degree((-2, -2, 0)), 1);
        assert_eq!(layout.degree((2, 1, 0)), 1);
    }
}
