//! Monster action selection.

use crate::action::ActionKind;
use crate::env::RngOracle;
use crate::state::Participant;

use ActionKind::{Attack, Charge, Defend};

/// Chooses the monster's action for the current round.
pub trait MonsterPolicy: Send + Sync {
    fn choose(&self, monster: &Participant, rng: &dyn RngOracle, seed: u64) -> ActionKind;
}

/// Weighted random choice over a candidate list picked by remaining HP.
///
/// Duplicates in a list encode weight.
#[derive(Clone, Copy, Debug, Default)]
pub struct WeightedMonsterAi;

impl WeightedMonsterAi {
    /// At or below 20% HP: lean on attacks.
    pub const DESPERATE: [ActionKind; 6] = [Attack, Attack, Attack, Defend, Defend, Charge];
    /// Above 20% and at or below 50% HP.
    pub const BALANCED: [ActionKind; 5] = [Attack, Attack, Defend, Defend, Charge];
    /// Above 50% HP.
    pub const AGGRESSIVE: [ActionKind; 6] = [Attack, Attack, Attack, Attack, Defend, Charge];

    /// Candidate list for the given HP.
    pub fn candidates(hp: u32, max_hp: u32) -> &'static [ActionKind] {
        let scaled = u64::from(hp) * 100;
        let max = u64::from(max_hp);
        if scaled <= 20 * max {
            &Self::DESPERATE
        } else if scaled <= 50 * max {
            &Self::BALANCED
        } else {
            &Self::AGGRESSIVE
        }
    }
}

impl MonsterPolicy for WeightedMonsterAi {
    fn choose(&self, monster: &Participant, rng: &dyn RngOracle, seed: u64) -> ActionKind {
        let candidates = Self::candidates(monster.hp, monster.max_hp);
        candidates[rng.choose_index(seed, candidates.len())]
    }
}

/// Always attacks. Used for scripted encounters.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysAttack;

impl MonsterPolicy for AlwaysAttack {
    fn choose(&self, _monster: &Participant, _rng: &dyn RngOracle, _seed: u64) -> ActionKind {
        Attack
    }
}
