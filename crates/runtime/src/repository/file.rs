//! File-based PetStore implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use battle_core::ParticipantId;

use super::{PetRecord, PetStore, RepositoryError, Result};

/// File-based implementation of [`PetStore`].
///
/// # File Format
///
/// One pretty-printed JSON document per pet, stored as `pet_{id}.json`.
/// Writes go to a temporary file first and are renamed into place.
pub struct FilePetStore {
    base_dir: PathBuf,
}

impl FilePetStore {
    /// Create a store rooted at `base_dir`, creating the directory if needed.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir).map_err(RepositoryError::Io)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn pet_path(&self, id: ParticipantId) -> PathBuf {
        self.base_dir.join(format!("pet_{}.json", id.raw()))
    }
}

#[async_trait]
impl PetStore for FilePetStore {
    async fn load(&self, id: ParticipantId) -> Result<PetRecord> {
        let path = self.pet_path(id);

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RepositoryError::NotFound { id });
            }
            Err(e) => return Err(RepositoryError::Io(e)),
        };
        let record: PetRecord =
            serde_json::from_slice(&bytes).map_err(|e| RepositoryError::Json(e.to_string()))?;

        tracing::debug!(target: "runtime::store", "Loaded pet[{}] from {}", id, path.display());

        Ok(record)
    }

    async fn save(&self, id: ParticipantId, record: &PetRecord) -> Result<bool> {
        let path = self.pet_path(id);
        let temp_path = path.with_extension("json.tmp");
        let existed = fs::try_exists(&path).await.map_err(RepositoryError::Io)?;

        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| RepositoryError::Json(e.to_string()))?;

        fs::write(&temp_path, json).await.map_err(RepositoryError::Io)?;
        fs::rename(&temp_path, &path)
            .await
            .map_err(RepositoryError::Io)?;

        tracing::debug!(target: "runtime::store", "Saved pet[{}] to {}", id, path.display());

        Ok(existed)
    }
}
