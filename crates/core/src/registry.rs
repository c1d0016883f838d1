use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::Rng;
use tracing::{debug, info};

use crate::room::Room;

const CODE_LEN: usize = 6;
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Process-wide table of rooms by code.
///
/// Created once at startup and shared via `Arc`. Lives for the process
/// lifetime; rooms are garbage-collected the moment they empty out.
pub struct RoomRegistry {
    rooms: DashMap<String, Arc<Room>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Registers a new empty room under a freshly generated code.
    ///
    /// Codes are short and human-typeable; a collision triggers
    /// regeneration rather than reuse.
    pub fn create_room(&self) -> String {
        loop {
            let code = generate_code();
            match self.rooms.entry(code.clone()) {
                Entry::Vacant(entry) => {
                    entry.insert(Arc::new(Room::new(code.clone())));
                    info!(%code, "Room created");
                    return code;
                }
                Entry::Occupied(_) => {
                    debug!(%code, "Room code collision, regenerating");
                }
            }
        }
    }

    /// Case-insensitive lookup.
    pub fn get(&self, code: &str) -> Option<Arc<Room>> {
        self.rooms.get(&code.to_uppercase()).map(|r| Arc::clone(&r))
    }

    /// Drops the room if its participant count reached zero. Called after
    /// every departure; no TTL, no zombie rooms.
    pub fn remove_if_empty(&self, code: &str) {
        let removed = self
            .rooms
            .remove_if(&code.to_uppercase(), |_, room| room.is_empty());
        if removed.is_some() {
            info!(%code, "Room deleted (empty)");
        }
    }

    /// Whether `room` is still the room registered under its code. A handle
    /// looked up before the last departure's sweep can go stale; inserting
    /// into such a room must be detected and undone by the caller.
    pub fn is_current(&self, room: &Arc<Room>) -> bool {
        self.rooms
            .get(room.code())
            .is_some_and(|current| Arc::ptr_eq(current.value(), room))
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}
