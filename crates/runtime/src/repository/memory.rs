//! In-memory PetStore implementation for tests and local runs.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use battle_core::ParticipantId;

use super::{PetRecord, PetStore, RepositoryError, Result};

/// In-memory implementation of [`PetStore`].
#[derive(Default)]
pub struct InMemoryPetStore {
    pets: RwLock<HashMap<ParticipantId, PetRecord>>,
}

impl InMemoryPetStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with `pets`.
    pub fn with_pets(pets: impl IntoIterator<Item = (ParticipantId, PetRecord)>) -> Self {
        Self {
            pets: RwLock::new(pets.into_iter().collect()),
        }
    }

    /// Synchronous read, for inspection outside async code.
    pub fn get(&self, id: ParticipantId) -> Option<PetRecord> {
        self.pets
            .read()
            .ok()
            .and_then(|pets| pets.get(&id).cloned())
    }

    pub fn len(&self) -> usize {
        self.pets.read().map(|pets| pets.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PetStore for InMemoryPetStore {
    async fn load(&self, id: ParticipantId) -> Result<PetRecord> {
        let pets = self
            .pets
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        pets.get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound { id })
    }

    async fn save(&self, id: ParticipantId, record: &PetRecord) -> Result<bool> {
        let mut pets = self
            .pets
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(pets.insert(id, record.clone()).is_some())
    }
}
