//! Monster catalog loader.

use std::path::Path;

use battle_core::{EnemyKind, MonsterSpec, Rarity, RngOracle};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::fallback::fallback_monster;
use crate::loaders::{LoadResult, read_file};

fn default_health() -> u32 {
    100
}

fn default_attack() -> u32 {
    10
}

fn default_defense() -> u32 {
    5
}

/// One catalog entry. Missing stats take the catalog defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_health")]
    pub health: u32,
    #[serde(default = "default_attack")]
    pub attack: u32,
    #[serde(default = "default_defense")]
    pub defense: u32,
    pub kind: EnemyKind,
    pub rarity: Rarity,
}

impl MonsterEntry {
    pub fn to_spec(&self) -> MonsterSpec {
        let name = self
            .name
            .clone()
            .unwrap_or_else(|| fallback_monster(self.kind, self.rarity).name);
        MonsterSpec {
            name,
            health: self.health,
            attack: self.attack,
            defense: self.defense,
            rarity: self.rarity,
            kind: self.kind,
        }
    }
}

/// Monster catalog structure for RON files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterCatalog {
    pub monsters: Vec<MonsterEntry>,
}

impl MonsterCatalog {
    /// Entries matching `kind` and `rarity`, in file order.
    pub fn lookup(&self, kind: EnemyKind, rarity: Rarity) -> Vec<&MonsterEntry> {
        self.monsters
            .iter()
            .filter(|entry| entry.kind == kind && entry.rarity == rarity)
            .collect()
    }

    /// Picks one matching monster at random, or the fallback monster when the
    /// catalog has none.
    pub fn select(
        &self,
        kind: EnemyKind,
        rarity: Rarity,
        rng: &dyn RngOracle,
        seed: u64,
    ) -> MonsterSpec {
        let matches = self.lookup(kind, rarity);
        if matches.is_empty() {
            warn!(
                target: "content::monsters",
                %kind,
                %rarity,
                "no catalog entry, using fallback monster"
            );
            return fallback_monster(kind, rarity);
        }
        matches[rng.choose_index(seed, matches.len())].to_spec()
    }
}

/// Loader for the monster catalog from RON files.
pub struct MonsterLoader;

impl MonsterLoader {
    /// Load a monster catalog from a RON file.
    ///
    /// ```ron
    /// (
    ///     monsters: [
    ///         (name: Some("Scrap Drone"), health: 50, attack: 10, defense: 5, kind: monster, rarity: common),
    ///     ],
    /// )
    /// ```
    pub fn load(path: &Path) -> LoadResult<MonsterCatalog> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<MonsterCatalog> {
        let catalog: MonsterCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse monster catalog RON: {}", e))?;

        Ok(catalog)
    }
}
