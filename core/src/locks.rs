//! Per-room critical sections.
//!
//! A booking's availability check and its insert must not interleave with
//! another booking on the same room. `RoomLocks` hands out one async mutex
//! per room; bookings on different rooms never contend.

use crate::types::RoomId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Idle entries are swept once the registry reaches this many rooms.
const PRUNE_THRESHOLD: usize = 64;

/// Registry of per-room async mutexes.
#[derive(Clone, Debug, Default)]
pub struct RoomLocks {
    rooms: Arc<Mutex<HashMap<RoomId, Arc<AsyncMutex<()>>>>>,
}

impl RoomLocks {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `room_id`.
    ///
    /// The section ends when the returned guard is dropped.
    pub async fn acquire(&self, room_id: RoomId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut rooms = self.rooms.lock().unwrap_or_else(PoisonError::into_inner);
            if rooms.len() >= PRUNE_THRESHOLD && !rooms.contains_key(&room_id) {
                // Drop entries nobody holds or waits on
                rooms.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            Arc::clone(rooms.entry(room_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of rooms with a live mutex.
    #[must_use]
    pub fn tracked_rooms(&self) -> usize {
        self.rooms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
