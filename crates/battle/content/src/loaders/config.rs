//! Battle balance configuration loader.

use std::path::Path;

use battle_core::BattleConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for battle configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a [`BattleConfig`] from a TOML file.
    ///
    /// Missing tables and keys keep their default values, so a file only needs
    /// to list what it overrides.
    pub fn load(path: &Path) -> LoadResult<BattleConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse a [`BattleConfig`] from TOML text.
    pub fn parse(content: &str) -> LoadResult<BattleConfig> {
        let config: BattleConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse battle config TOML: {}", e))?;

        Ok(config)
    }
}
