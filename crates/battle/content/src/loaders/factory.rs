//! Content factory for loading battle content from a data directory.

use std::path::{Path, PathBuf};

use battle_core::BattleConfig;

use crate::loaders::{ConfigLoader, LoadResult, MonsterCatalog, MonsterLoader};

/// Loads all battle content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── battle.toml
/// └── monsters.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Data directory shipped with this crate.
    pub fn bundled() -> Self {
        Self::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("data"))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Load battle configuration from `battle.toml`.
    pub fn load_config(&self) -> LoadResult<BattleConfig> {
        ConfigLoader::load(&self.data_dir.join("battle.toml"))
    }

    /// Load the monster catalog from `monsters.ron`.
    pub fn load_monsters(&self) -> LoadResult<MonsterCatalog> {
        MonsterLoader::load(&self.data_dir.join("monsters.ron"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::{EnemyKind, Rarity};

    #[test]
    fn bundled_content_loads() {
        let factory = ContentFactory::bundled();
        let config = factory.load_config().unwrap();
        assert_eq!(config, BattleConfig::default());

        let catalog = factory.load_monsters().unwrap();
        assert!(!catalog.lookup(EnemyKind::Monster, Rarity::Common).is_empty());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let factory = ContentFactory::new("/nonexistent/battle-data");
        assert!(factory.load_config().is_err());
        assert!(factory.load_monsters().is_err());
    }
}
