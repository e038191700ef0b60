//! Termination detection and reward distribution.
mod rewards;

pub use rewards::summarize;

use std::collections::BTreeMap;

use crate::state::{BattleMode, BattleState, ParticipantId, Rarity, SideId, VictoryRule};

/// How a battle ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleOutcome {
    /// One side has members standing (or the monster fell).
    Won { side: SideId },
    /// Nobody is left standing, or several sides remain after a forfeit.
    Draw,
}

impl BattleOutcome {
    /// Outcome from the point of view of a participant on `side`.
    pub fn for_side(&self, side: SideId) -> Outcome {
        match self {
            Self::Won { side: winner } if *winner == side => Outcome::Victory,
            Self::Won { .. } => Outcome::Defeat,
            Self::Draw => Outcome::Draw,
        }
    }
}

/// Per-participant result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    Victory,
    Defeat,
    Draw,
}

/// Loot granted to a survivor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LootAward {
    pub rarity: Rarity,
    pub count: u32,
}

/// Everything a participant earns from one battle.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParticipantReward {
    pub participant: ParticipantId,
    pub outcome: Outcome,
    pub final_hp: u32,
    pub max_hp: u32,
    pub xp: u64,
    pub currency: u64,
    pub loot: Option<LootAward>,
}

/// End-of-battle payload handed to the pet store.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleSummary {
    pub mode: BattleMode,
    pub outcome: BattleOutcome,
    pub rounds: u32,
    /// Rewards for player-controlled participants only.
    pub rewards: BTreeMap<ParticipantId, ParticipantReward>,
}

/// Checks the mode's termination rule. `None` while the battle continues.
pub fn evaluate_victory(state: &BattleState) -> Option<BattleOutcome> {
    match state.mode.victory_rule() {
        VictoryRule::MonsterOrParty => {
            let monster = state.monster()?;
            if !monster.alive || monster.hp == 0 {
                return Some(BattleOutcome::Won { side: SideId::PARTY });
            }
            let party_down = state
                .participants
                .values()
                .filter(|p| p.is_player())
                .all(|p| !p.alive || p.hp == 0);
            party_down.then_some(BattleOutcome::Won { side: monster.side })
        }
        VictoryRule::LastSide => {
            let sides = state.alive_sides();
            match sides.len() {
                0 => Some(BattleOutcome::Draw),
                1 => sides.first().map(|side| BattleOutcome::Won { side: *side }),
                _ => None,
            }
        }
        VictoryRule::LastStanding => {
            let mut alive = state.participants.values().filter(|p| p.alive);
            match (alive.next(), alive.next()) {
                (None, _) => Some(BattleOutcome::Draw),
                (Some(survivor), None) => Some(BattleOutcome::Won { side: survivor.side }),
                _ => None,
            }
        }
    }
}

/// Outcome when `side` surrenders.
///
/// A single other side still standing wins; otherwise the battle is a draw.
pub fn forfeit_outcome(state: &BattleState, side: SideId) -> BattleOutcome {
    let remaining: Vec<SideId> = state
        .alive_sides()
        .into_iter()
        .filter(|s| *s != side)
        .collect();
    match remaining.as_slice() {
        [winner] => BattleOutcome::Won { side: *winner },
        _ => BattleOutcome::Draw,
    }
}
