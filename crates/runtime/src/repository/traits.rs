//! Repository contract for pet records.

use async_trait::async_trait;

use battle_core::ParticipantId;

use super::{PetRecord, Result};

/// Persistent store of pet records keyed by participant.
#[async_trait]
pub trait PetStore: Send + Sync {
    /// Load the record for `id`.
    async fn load(&self, id: ParticipantId) -> Result<PetRecord>;

    /// Write the record for `id`. Returns `true` when an existing record was
    /// replaced and `false` when it was created.
    async fn save(&self, id: ParticipantId, record: &PetRecord) -> Result<bool>;
}
