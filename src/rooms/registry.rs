use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use tracing::info;

use super::{Room, RoomKey};

/// Process-wide table of rooms, created on first use.
///
/// Rooms are never evicted. `shutdown` exists for process teardown.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: Mutex<HashMap<RoomKey, Arc<Room>>>,
    queue_capacity: usize,
}

impl RoomRegistry {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            queue_capacity,
        }
    }

    /// Returns the room for `key`, creating it and starting its relay loop if
    /// this is the first caller. Concurrent callers always see the same room.
    pub fn get_or_create(&self, key: &RoomKey) -> Arc<Room> {
        let mut rooms = self.rooms.lock();
        if let Some(room) = rooms.get(key) {
            return room.clone();
        }

        info!(room = %key, "creating room");
        let room = Room::spawn(key.clone(), self.queue_capacity);
        rooms.insert(key.clone(), room.clone());
        room
    }

    pub fn get(&self, key: &RoomKey) -> Option<Arc<Room>> {
        self.rooms.lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.rooms.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.lock().is_empty()
    }

    /// Stops every room's relay loop. Rooms stay registered but refuse new messages.
    pub fn shutdown(&self) {
        let rooms: Vec<_> = self.rooms.lock().values().cloned().collect();
        info!(rooms = rooms.len(), "shutting down relay loops");
        for room in rooms {
            room.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_key_yields_same_room() {
        let registry = RoomRegistry::new(4);
        let a = registry.get_or_create(&RoomKey::pairwise(5, 9));
        let b = registry.get_or_create(&RoomKey::pairwise(9, 5));

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn different_keys_yield_different_rooms() {
        let registry = RoomRegistry::new(4);
        let pair = registry.get_or_create(&RoomKey::pairwise(5, 9));
        let other = registry.get_or_create(&RoomKey::pairwise(5, 7));
        let group = registry.get_or_create(&RoomKey::group(59));

        assert!(!Arc::ptr_eq(&pair, &other));
        assert!(!Arc::ptr_eq(&pair, &group));
        assert_eq!(registry.len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_first_joiners_share_one_room() {
        let registry = Arc::new(RoomRegistry::new(4));
        let key = RoomKey::group(42);

        let tasks: Vec<_> = (0..64)
            .map(|_| {
                let registry = registry.clone();
                let key = key.clone();
                tokio::spawn(async move { registry.get_or_create(&key) })
            })
            .collect();

        let mut rooms = Vec::new();
        for task in tasks {
            rooms.push(task.await.unwrap());
        }

        assert_eq!(registry.len(), 1);
        let first = registry.get(&key).unwrap();
        assert!(rooms.iter().all(|room| Arc::ptr_eq(room, &first)));
    }

    #[tokio::test]
    async fn get_does_not_create() {
        let registry = RoomRegistry::new(4);
        assert!(registry.get(&RoomKey::group(1)).is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn shutdown_closes_every_room() {
        let registry = RoomRegistry::new(4);
        let a = registry.get_or_create(&RoomKey::group(1));
        let b = registry.get_or_create(&RoomKey::pairwise(1, 2));

        registry.shutdown();

        assert!(a.is_shut_down() && b.is_shut_down());
        assert_eq!(registry.len(), 2);
    }
}
