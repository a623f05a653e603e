//! Concurrency-safe room registry.
//!
//! Rooms live in a sharded map of `Arc<RwLock<GameSession>>` cells. The map's
//! shard locks are only touched to locate or insert a cell and are released
//! before any awaiting, so one room's long critical section (bounded by the
//! randomness timeout) never stalls another room. Within a room, writers are
//! exclusive and admitted in order; readers may overlap each other.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

use crate::session::GameSession;

#[derive(Default)]
pub struct SessionRegistry {
    rooms: DashMap<String, Arc<RwLock<GameSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Locates the room cell, lazily inserting a fresh `NotStarted` session
    /// on first exclusive reference. The shard guard is dropped on return.
    fn cell(&self, room_id: &str) -> Arc<RwLock<GameSession>> {
        self.rooms
            .entry(room_id.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(GameSession::new(room_id))))
            .value()
            .clone()
    }

    /// Runs `f` under the room's exclusive lock, creating the room if needed.
    pub async fn with_session<F, Fut, R>(&self, room_id: &str, f: F) -> R
    where
        F: FnOnce(OwnedRwLockWriteGuard<GameSession>) -> Fut,
        Fut: Future<Output = R>,
    {
        let cell = self.cell(room_id);
        let guard = cell.write_owned().await;
        f(guard).await
    }

    /// Runs `f` under the room's shared lock. Reads never create rooms;
    /// returns `None` for an unknown id.
    pub async fn with_session_read<F, Fut, R>(&self, room_id: &str, f: F) -> Option<R>
    where
        F: FnOnce(OwnedRwLockReadGuard<GameSession>) -> Fut,
        Fut: Future<Output = R>,
    {
        let cell = self.rooms.get(room_id)?.value().clone();
        let guard = cell.read_owned().await;
        Some(f(guard).await)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
