//! Injected collaborators for round resolution.
//!
//! The [`BattleEnv`] aggregate bundles the random source and the monster policy
//! so the engine stays free of global state and tests can pin every roll.
mod rng;

pub use rng::{FixedRng, PcgRng, RngOracle, RollContext, compute_seed};

use crate::ai::{MonsterPolicy, WeightedMonsterAi};

static DEFAULT_MONSTER_AI: WeightedMonsterAi = WeightedMonsterAi;

/// Read-only collaborators used while resolving a round.
#[derive(Clone, Copy)]
pub struct BattleEnv<'a> {
    rng: &'a dyn RngOracle,
    monster_ai: &'a dyn MonsterPolicy,
}

impl<'a> BattleEnv<'a> {
    /// Environment with the weighted monster AI.
    pub fn new(rng: &'a dyn RngOracle) -> Self {
        Self {
            rng,
            monster_ai: &DEFAULT_MONSTER_AI,
        }
    }

    /// Replaces the monster policy (builder pattern).
    #[must_use]
    pub fn with_monster_ai(mut self, monster_ai: &'a dyn MonsterPolicy) -> Self {
        self.monster_ai = monster_ai;
        self
    }

    pub fn rng(&self) -> &'a dyn RngOracle {
        self.rng
    }

    pub fn monster_ai(&self) -> &'a dyn MonsterPolicy {
        self.monster_ai
    }
}

impl core::fmt::Debug for BattleEnv<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BattleEnv").finish_non_exhaustive()
    }
}
