use hashlink::LinkedHashMap;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::geometry::Rect;

pub type RoomId = usize;

/// Template for stamping out rooms. Many rooms may share one entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub width: i32,
    pub height: i32,
}

impl CatalogEntry {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Fill colour. Only renderers look at this.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RoomColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RoomColor {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            r: rng.gen(),
            g: rng.gen(),
            b: rng.gen(),
        }
    }
}

impl Default for RoomColor {
    fn default() -> Self {
        Self { r: 128, g: 128, b: 128 }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub rect: Rect,
    pub color: RoomColor,
}

impl Room {
    pub fn new(id: RoomId, x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            id,
            rect: Rect::new(x, y, width, height),
            color: RoomColor::default(),
        }
    }

    pub fn with_color(self, color: RoomColor) -> Self {
        Self { color, ..self }
    }
}

/// A link between two rooms. Layout generation never creates these; the type is kept so that
/// callers building a room graph on top of a layout have a shared vocabulary.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct RoomConnection {
    pub start: RoomId,
    pub end: RoomId,
}

impl RoomConnection {
    pub fn new(start: RoomId, end: RoomId) -> Self {
        Self { start, end }
    }
}

/// Rooms keyed by id, iterated in insertion order. Both layout phases walk rooms in this order and
/// draw random numbers as they go, so the order is part of what makes a seed reproducible.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoomCollection {
    rooms: LinkedHashMap<RoomId, Room>,
}

impl RoomCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a room under its own id, returning the room previously stored under that id.
    pub fn insert(&mut self, room: Room) -> Option<Room> {
        self.rooms.insert(room.id, room)
    }

    pub fn get(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(&id)
    }

    pub fn rect(&self, id: RoomId) -> Option<Rect> {
        self.rooms.get(&id).map(|room| room.rect)
    }

    pub fn translate(&mut self, id: RoomId, dx: i32, dy: i32) {
        if let Some(room) = self.rooms.get_mut(&id) {
            room.rect.move_by(dx, dy);
        }
    }

    pub fn ids(&self) -> Vec<RoomId> {
        self.rooms.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Every ordered pair (a, b), a before b, where a's box overlaps b's. Quadratic; meant for
    /// verification rather than the layout loops.
    pub fn overlapping_pairs(&self) -> Vec<(RoomId, RoomId)> {
        let rooms: Vec<&Room> = self.rooms.values().collect();
        let mut result = vec![];
        for (i, first) in rooms.iter().enumerate() {
            for second in rooms.iter().skip(i + 1) {
                if first.rect.overlaps(&second.rect) || second.rect.overlaps(&first.rect) {
                    result.push((first.id, second.id));
                }
            }
        }
        result
    }
}

impl Serialize for RoomCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rooms.values())
    }
}

impl<'de> Deserialize<'de> for RoomCollection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<Room>::deserialize(deserializer).map(|rooms| rooms.into_iter().collect())
    }
}

impl FromIterator<Room> for RoomCollection {
    fn from_iter<T: IntoIterator<Item = Room>>(iter: T) -> Self {
        let mut collection = RoomCollection::new();
        for room in iter {
            collection.insert(room);
        }
        collection
    }
}
