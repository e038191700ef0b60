use super::{CombatStats, CombatantSpec, ParticipantId};

/// Rarity tier shared by monsters and loot.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Mythic,
}

/// Encounter class; scales rewards and selects the loot buckets.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EnemyKind {
    Monster,
    Boss,
    Titan,
}

/// NPC descriptor for a PvE encounter.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonsterSpec {
    pub name: String,
    pub health: u32,
    pub attack: u32,
    pub defense: u32,
    pub rarity: Rarity,
    pub kind: EnemyKind,
}

impl MonsterSpec {
    pub(crate) fn to_combatant(&self) -> CombatantSpec {
        CombatantSpec::new(
            ParticipantId::MONSTER,
            self.name.clone(),
            CombatStats::new(self.attack, self.defense),
            self.health,
        )
    }
}
