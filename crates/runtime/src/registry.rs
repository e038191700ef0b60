//! Live sessions indexed by battle id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::api::{BattleHandle, BattleId, Result, RuntimeError};

/// Shared map of running battles. Sessions remove themselves when they end.
///
/// Battle ids are persisted in pet records to keep reward settlement
/// idempotent, so every registry draws a random epoch for the high 32 bits
/// of the ids it hands out. Two processes sharing a pet store therefore never
/// reuse an id.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<BattleId, BattleHandle>>>,
    next_id: Arc<AtomicU64>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::with_epoch(rand::random())
    }

    /// Registry whose ids are `epoch << 32 | sequence`, with the sequence
    /// starting at 1.
    pub fn with_epoch(epoch: u32) -> Self {
        Self {
            sessions: Arc::default(),
            next_id: Arc::new(AtomicU64::new(u64::from(epoch) << 32)),
        }
    }

    /// Allocates a fresh battle id.
    pub(crate) fn allocate(&self) -> BattleId {
        BattleId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    pub fn insert(&self, handle: BattleHandle) -> Result<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| RuntimeError::LockPoisoned)?;
        sessions.insert(handle.id(), handle);
        Ok(())
    }

    pub fn get(&self, battle: BattleId) -> Result<Option<BattleHandle>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| RuntimeError::LockPoisoned)?;
        Ok(sessions.get(&battle).cloned())
    }

    pub fn remove(&self, battle: BattleId) -> Result<Option<BattleHandle>> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| RuntimeError::LockPoisoned)?;
        Ok(sessions.remove(&battle))
    }

    /// Ids of every running battle, ascending.
    pub fn active_ids(&self) -> Result<Vec<BattleId>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| RuntimeError::LockPoisoned)?;
        let mut ids: Vec<BattleId> = sessions.keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
