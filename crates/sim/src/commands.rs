//! `pve` and `pvp` subcommands.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use battle_content::{ContentFactory, MonsterCatalog};
use battle_core::{BattleMode, EnemyKind, ParticipantId, Rarity, SideId};
use battle_runtime::{BattleRuntime, InMemoryPetStore, PetRecord, RuntimeConfig};

use crate::{driver, narrate};

const NAMES: [&str; 8] = [
    "Sparky", "Bolt", "Fizz", "Gizmo", "Rivet", "Widget", "Cog", "Servo",
];

/// Run a party against a monster from the catalog
#[derive(Parser)]
pub struct Pve {
    /// Enemy kind (monster, boss, titan)
    #[arg(long, default_value = "monster", value_parser = parse_kind)]
    kind: EnemyKind,

    /// Enemy rarity (common .. mythic)
    #[arg(long, default_value = "common", value_parser = parse_rarity)]
    rarity: Rarity,

    /// Party size; a single player fights a solo battle
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=8))]
    players: u8,

    /// Seed for every roll (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Content directory holding battle.toml and monsters.ron
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,
}

impl Pve {
    pub async fn execute(self) -> Result<()> {
        let (config, monsters) = load_content(self.data_dir)?;
        let store = Arc::new(InMemoryPetStore::with_pets(roster(self.players)));
        let runtime = BattleRuntime::builder()
            .config(config)
            .pet_store(store.clone())
            .monsters(monsters)
            .build();

        let mode = if self.players == 1 {
            BattleMode::SoloPve
        } else {
            BattleMode::GroupPve
        };
        let party: Vec<ParticipantId> = (1..=u64::from(self.players)).map(ParticipantId).collect();

        let handle = runtime
            .open_encounter(mode, &party, self.kind, self.rarity, self.seed)
            .await?;
        info!(target: "sim", battle = %handle.id(), %mode, kind = %self.kind, rarity = %self.rarity, "battle opened");

        let summary = driver::play(&handle).await?;
        narrate::print_summary(&summary, &driver::names(&handle.query_state().await?));
        print_records(&store, &party);

        runtime.shutdown().await?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum PvpMode {
    /// Everyone for themselves
    Ffa,
    /// Two alternating teams
    Team,
    /// One-on-one bracket match rules
    Tournament,
}

impl PvpMode {
    fn battle_mode(self) -> BattleMode {
        match self {
            Self::Ffa => BattleMode::PvpFreeForAll,
            Self::Team => BattleMode::PvpTeam,
            Self::Tournament => BattleMode::Tournament,
        }
    }

    fn side(self, index: u32) -> SideId {
        match self {
            Self::Team => SideId(index % 2),
            Self::Ffa | Self::Tournament => SideId(index),
        }
    }
}

/// Run a player-versus-player battle
#[derive(Parser)]
pub struct Pvp {
    /// Battle rules
    #[arg(long, value_enum, default_value = "ffa")]
    mode: PvpMode,

    /// Number of entrants
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(2..=8))]
    players: u8,

    /// Seed for every roll (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Content directory holding battle.toml
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,
}

impl Pvp {
    pub async fn execute(self) -> Result<()> {
        let (config, _) = load_content(self.data_dir)?;
        let store = Arc::new(InMemoryPetStore::with_pets(roster(self.players)));
        let runtime = BattleRuntime::builder()
            .config(config)
            .pet_store(store.clone())
            .build();

        let entrants: Vec<(ParticipantId, SideId)> = (0..u32::from(self.players))
            .map(|index| (ParticipantId(u64::from(index) + 1), self.mode.side(index)))
            .collect();
        let mode = self.mode.battle_mode();

        let handle = runtime.open_pvp(mode, &entrants, self.seed).await?;
        info!(target: "sim", battle = %handle.id(), %mode, entrants = entrants.len(), "battle opened");

        let summary = driver::play(&handle).await?;
        narrate::print_summary(&summary, &driver::names(&handle.query_state().await?));
        let ids: Vec<ParticipantId> = entrants.iter().map(|(id, _)| *id).collect();
        print_records(&store, &ids);

        runtime.shutdown().await?;
        Ok(())
    }
}

fn parse_kind(value: &str) -> Result<EnemyKind, String> {
    value
        .parse()
        .map_err(|_| format!("unknown enemy kind '{}' (monster, boss, titan)", value))
}

fn parse_rarity(value: &str) -> Result<Rarity, String> {
    value
        .parse()
        .map_err(|_| format!("unknown rarity '{}' (common .. mythic)", value))
}

/// Runtime configuration and monster catalog, from `data_dir` or the bundled content.
fn load_content(data_dir: Option<PathBuf>) -> Result<(RuntimeConfig, MonsterCatalog)> {
    let mut config = RuntimeConfig::from_env();
    let factory = match data_dir {
        Some(dir) => {
            let factory = ContentFactory::new(dir);
            config.battle = factory.load_config().context("loading battle config")?;
            factory
        }
        None => ContentFactory::bundled(),
    };
    let monsters = factory
        .load_monsters()
        .with_context(|| format!("loading monsters from {}", factory.data_dir().display()))?;
    Ok((config, monsters))
}

/// Pets with slightly staggered stats so battles are not perfectly symmetric.
fn roster(count: u8) -> Vec<(ParticipantId, PetRecord)> {
    (0..u32::from(count))
        .map(|index| {
            let name = NAMES[index as usize % NAMES.len()];
            let record = PetRecord::new(name, 18 + 3 * index, 8 + index, 100 + 10 * index)
                .with_equipment(2, 2);
            (ParticipantId(u64::from(index) + 1), record)
        })
        .collect()
}

fn print_records(store: &InMemoryPetStore, ids: &[ParticipantId]) {
    println!();
    println!("Pet records");
    for &id in ids {
        if let Some(record) = store.get(id) {
            println!(
                "  {:<8} xp {:>4}  currency {:>4}  W/L/D {}/{}/{}  loot {}",
                record.name,
                record.experience,
                record.currency,
                record.battles_won,
                record.battles_lost,
                record.battles_drawn,
                record.loot.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_ids_start_at_one() {
        let pets = roster(3);
        assert_eq!(pets[0].0, ParticipantId(1));
        assert_eq!(pets[2].1.name, "Fizz");
        assert_eq!(pets[2].1.attack, 24);
    }

    #[test]
    fn enemy_flags_parse_case_insensitively() {
        assert_eq!(parse_kind("Boss"), Ok(EnemyKind::Boss));
        assert_eq!(parse_rarity("mythic"), Ok(Rarity::Mythic));
        assert!(parse_rarity("shiny").is_err());
    }

    #[test]
    fn team_mode_alternates_sides() {
        assert_eq!(PvpMode::Team.side(3), SideId(1));
        assert_eq!(PvpMode::Ffa.side(3), SideId(3));
    }
}
