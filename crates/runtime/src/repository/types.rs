//! Persistent pet record.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use battle_core::{CombatStats, CombatantSpec, LootAward, Outcome, ParticipantId, ParticipantReward};

use crate::api::BattleId;

/// Stats and progression of one pet, as kept by the pet store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetRecord {
    pub name: String,
    pub attack: u32,
    pub defense: u32,
    #[serde(default)]
    pub equipment_attack: u32,
    #[serde(default)]
    pub equipment_defense: u32,
    pub max_hp: u32,
    #[serde(default)]
    pub experience: u64,
    #[serde(default)]
    pub currency: u64,
    #[serde(default)]
    pub battles_won: u32,
    #[serde(default)]
    pub battles_lost: u32,
    #[serde(default)]
    pub battles_drawn: u32,
    #[serde(default)]
    pub loot: Vec<LootAward>,
    /// Battles whose rewards are already applied to this record.
    #[serde(default)]
    pub settled_battles: BTreeSet<BattleId>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PetRecord {
    pub fn new(name: impl Into<String>, attack: u32, defense: u32, max_hp: u32) -> Self {
        Self {
            name: name.into(),
            attack,
            defense,
            equipment_attack: 0,
            equipment_defense: 0,
            max_hp,
            experience: 0,
            currency: 0,
            battles_won: 0,
            battles_lost: 0,
            battles_drawn: 0,
            loot: Vec::new(),
            settled_battles: BTreeSet::new(),
            updated_at: None,
        }
    }

    #[must_use]
    pub fn with_equipment(mut self, attack: u32, defense: u32) -> Self {
        self.equipment_attack = attack;
        self.equipment_defense = defense;
        self
    }

    /// Battle entry for this pet at full health.
    pub fn to_combatant(&self, id: ParticipantId) -> CombatantSpec {
        let stats = CombatStats::new(self.attack, self.defense)
            .with_equipment(self.equipment_attack, self.equipment_defense);
        CombatantSpec::new(id, self.name.clone(), stats, self.max_hp)
    }

    /// Applies one battle's reward. Returns `false` when `battle` was already
    /// settled on this record, leaving it unchanged.
    pub fn apply_reward(&mut self, battle: BattleId, reward: &ParticipantReward) -> bool {
        if !self.settled_battles.insert(battle) {
            return false;
        }
        self.experience += reward.xp;
        self.currency += reward.currency;
        match reward.outcome {
            Outcome::Victory => self.battles_won += 1,
            Outcome::Defeat => self.battles_lost += 1,
            Outcome::Draw => self.battles_drawn += 1,
        }
        if let Some(loot) = reward.loot {
            self.loot.push(loot);
        }
        self.updated_at = Some(Utc::now());
        true
    }
}
