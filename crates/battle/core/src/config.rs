//! Balance parameters for every battle mode.
//!
//! `Default` reproduces the designed curves exactly. Content loaders may
//! override individual tables from TOML; missing sections fall back to the
//! defaults below.

use crate::state::{EnemyKind, Rarity};

/// Top-level battle configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BattleConfig {
    pub damage: DamageParams,
    pub charge: ChargeParams,
    pub fallback: FallbackStats,
    pub rewards: RewardParams,
    /// Seconds a round stays open for submissions before default actions apply.
    pub round_timeout_secs: u64,
    /// Consecutive rounds that time out without a single PvE submission
    /// before the party is forfeited. Zero disables the limit.
    pub idle_round_limit: u32,
}

impl BattleConfig {
    pub const DEFAULT_ROUND_TIMEOUT_SECS: u64 = 60;
    pub const DEFAULT_IDLE_ROUND_LIMIT: u32 = 10;

    pub fn new() -> Self {
        Self {
            damage: DamageParams::default(),
            charge: ChargeParams::default(),
            fallback: FallbackStats::default(),
            rewards: RewardParams::default(),
            round_timeout_secs: Self::DEFAULT_ROUND_TIMEOUT_SECS,
            idle_round_limit: Self::DEFAULT_IDLE_ROUND_LIMIT,
        }
    }

    pub fn with_round_timeout(mut self, secs: u64) -> Self {
        self.round_timeout_secs = secs;
        self
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Damage arithmetic parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DamageParams {
    /// Critical hit chance, in percent, checked against a d100.
    pub critical_chance_percent: u32,
    pub critical_multiplier: f64,
    /// Defense multiplier while actively defending.
    pub defend_multiplier: f64,
    /// Defense divisor while not defending.
    pub unguarded_defense_divisor: u32,
    /// Incoming damage multiplier for undefended targets that charged this round.
    pub charging_vulnerability: f64,
    /// Extra multiplier on the banked charge when the attacker is flagged as charging.
    pub charging_attack_bonus: f64,
}

impl Default for DamageParams {
    fn default() -> Self {
        Self {
            critical_chance_percent: 5,
            critical_multiplier: 1.5,
            defend_multiplier: 2.0,
            unguarded_defense_divisor: 2,
            charging_vulnerability: 1.5,
            charging_attack_bonus: 2.0,
        }
    }
}

/// Charge escalation parameters for both charge policies.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChargeParams {
    /// Upper bound for the doubling policy used by PvE modes.
    pub doubling_cap: f64,
    /// Discrete progression used by PvP and tournament modes.
    pub progression: Vec<f64>,
}

impl ChargeParams {
    /// Doubles the multiplier, capped at `doubling_cap`.
    pub fn double(&self, current: f64) -> f64 {
        (current * 2.0).min(self.doubling_cap)
    }

    /// Advances one step along the progression.
    ///
    /// The last entry is terminal. A value that is not on the progression
    /// restarts at the second step.
    pub fn advance(&self, current: f64) -> f64 {
        let position = self
            .progression
            .iter()
            .position(|step| (step - current).abs() < f64::EPSILON);

        match position {
            Some(idx) => self
                .progression
                .get(idx + 1)
                .or_else(|| self.progression.last())
                .copied()
                .unwrap_or(current),
            None => self.progression.get(1).copied().unwrap_or(current),
        }
    }
}

impl Default for ChargeParams {
    fn default() -> Self {
        Self {
            doubling_cap: 5.0,
            progression: vec![1.0, 2.0, 4.0, 8.0, 16.0],
        }
    }
}

/// Baseline stats substituted when the pet store cannot supply a participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FallbackStats {
    pub attack: u32,
    pub defense: u32,
    pub max_hp: u32,
}

impl Default for FallbackStats {
    fn default() -> Self {
        Self {
            attack: 10,
            defense: 5,
            max_hp: 100,
        }
    }
}

/// Reward tables for PvE victories, defeats and PvP results.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RewardParams {
    /// Monster max HP is divided by this to get the base reward.
    pub health_divisor: u32,
    pub rarity: RarityMultipliers,
    pub enemy_kind: EnemyKindMultipliers,
    /// Percent of the victory reward granted as participation XP.
    pub defeat_xp_percent: u64,
    pub loot: LootParams,
    pub pvp: PvpXpParams,
}

impl RewardParams {
    /// Total victory reward for defeating the given monster.
    pub fn victory_total(&self, monster_max_hp: u32, rarity: Rarity, kind: EnemyKind) -> u64 {
        let base = u64::from(monster_max_hp / self.health_divisor.max(1));
        (base as f64 * self.rarity.get(rarity) * self.enemy_kind.get(kind)) as u64
    }

    /// Participation XP for fallen or defeated party members.
    pub fn participation_xp(&self, victory_total: u64) -> u64 {
        victory_total * self.defeat_xp_percent / 100
    }
}

impl Default for RewardParams {
    fn default() -> Self {
        Self {
            health_divisor: 10,
            rarity: RarityMultipliers::default(),
            enemy_kind: EnemyKindMultipliers::default(),
            defeat_xp_percent: 35,
            loot: LootParams::default(),
            pvp: PvpXpParams::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RarityMultipliers {
    pub common: f64,
    pub uncommon: f64,
    pub rare: f64,
    pub epic: f64,
    pub legendary: f64,
    pub mythic: f64,
}

impl RarityMultipliers {
    pub fn get(&self, rarity: Rarity) -> f64 {
        match rarity {
            Rarity::Common => self.common,
            Rarity::Uncommon => self.uncommon,
            Rarity::Rare => self.rare,
            Rarity::Epic => self.epic,
            Rarity::Legendary => self.legendary,
            Rarity::Mythic => self.mythic,
        }
    }
}

impl Default for RarityMultipliers {
    fn default() -> Self {
        Self {
            common: 1.0,
            uncommon: 1.5,
            rare: 2.0,
            epic: 3.0,
            legendary: 5.0,
            mythic: 10.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EnemyKindMultipliers {
    pub monster: f64,
    pub boss: f64,
    pub titan: f64,
}

impl EnemyKindMultipliers {
    pub fn get(&self, kind: EnemyKind) -> f64 {
        match kind {
            EnemyKind::Monster => self.monster,
            EnemyKind::Boss => self.boss,
            EnemyKind::Titan => self.titan,
        }
    }
}

impl Default for EnemyKindMultipliers {
    fn default() -> Self {
        Self {
            monster: 1.0,
            boss: 2.0,
            titan: 5.0,
        }
    }
}

/// Loot breakpoints keyed on the survivor's remaining health fraction.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LootParams {
    /// At or below this fraction no loot drops.
    pub floor_fraction: f64,
    /// At or above this fraction `guaranteed_items` drop.
    pub ceiling_fraction: f64,
    pub min_chance: f64,
    pub guaranteed_items: u32,
    /// Fraction at which the rarity moves to the upper bucket.
    pub rarity_split: f64,
}

impl LootParams {
    /// Probability of a single drop for the given health fraction.
    pub fn chance(&self, fraction: f64) -> f64 {
        if fraction <= self.floor_fraction {
            self.min_chance
        } else if fraction >= self.ceiling_fraction {
            1.0
        } else {
            let span = self.ceiling_fraction - self.floor_fraction;
            self.min_chance + (fraction - self.floor_fraction) * ((1.0 - self.min_chance) / span)
        }
    }

    /// Number of items dropped, given a uniform draw in `[0, 1)`.
    pub fn item_count(&self, fraction: f64, draw: f64) -> u32 {
        if fraction <= self.floor_fraction {
            0
        } else if fraction >= self.ceiling_fraction {
            self.guaranteed_items
        } else if draw <= self.chance(fraction) {
            1
        } else {
            0
        }
    }

    /// Loot rarity: two buckets per enemy kind, split on remaining health.
    pub fn rarity(&self, kind: EnemyKind, fraction: f64) -> Rarity {
        let upper = fraction >= self.rarity_split;
        match (kind, upper) {
            (EnemyKind::Monster, false) => Rarity::Common,
            (EnemyKind::Monster, true) => Rarity::Uncommon,
            (EnemyKind::Boss, false) => Rarity::Rare,
            (EnemyKind::Boss, true) => Rarity::Epic,
            (EnemyKind::Titan, false) => Rarity::Legendary,
            (EnemyKind::Titan, true) => Rarity::Mythic,
        }
    }
}

impl Default for LootParams {
    fn default() -> Self {
        Self {
            floor_fraction: 0.1,
            ceiling_fraction: 0.9,
            min_chance: 0.10,
            guaranteed_items: 2,
            rarity_split: 0.5,
        }
    }
}

/// PvP experience formula constants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PvpXpParams {
    pub base: u64,
    pub per_round: u64,
    pub team_win_bonus: u64,
    pub solo_win_bonus: u64,
    pub per_kill: u64,
    pub per_assist: u64,
    /// Damage dealt is divided by this before the cap applies.
    pub damage_divisor: u64,
    pub damage_cap: u64,
}

impl Default for PvpXpParams {
    fn default() -> Self {
        Self {
            base: 50,
            per_round: 5,
            team_win_bonus: 50,
            solo_win_bonus: 100,
            per_kill: 25,
            per_assist: 10,
            damage_divisor: 2,
            damage_cap: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubling_caps_at_five() {
        let charge = ChargeParams::default();
        assert_eq!(charge.double(1.0), 2.0);
        assert_eq!(charge.double(2.0), 4.0);
        assert_eq!(charge.double(4.0), 5.0);
        assert_eq!(charge.double(5.0), 5.0);
    }

    #[test]
    fn progression_steps_and_caps() {
        let charge = ChargeParams::default();
        assert_eq!(charge.advance(1.0), 2.0);
        assert_eq!(charge.advance(2.0), 4.0);
        assert_eq!(charge.advance(8.0), 16.0);
        assert_eq!(charge.advance(16.0), 16.0);
        // Off-table values restart at the second step.
        assert_eq!(charge.advance(3.0), 2.0);
    }

    #[test]
    fn victory_total_applies_both_multipliers() {
        let rewards = RewardParams::default();
        assert_eq!(rewards.victory_total(50, Rarity::Common, EnemyKind::Monster), 5);
        assert_eq!(rewards.victory_total(155, Rarity::Uncommon, EnemyKind::Monster), 22);
        assert_eq!(rewards.victory_total(300, Rarity::Epic, EnemyKind::Boss), 180);
        assert_eq!(rewards.victory_total(500, Rarity::Mythic, EnemyKind::Titan), 2500);
        assert_eq!(rewards.participation_xp(100), 35);
    }

    #[test]
    fn loot_breakpoints() {
        let loot = LootParams::default();
        assert_eq!(loot.chance(0.05), 0.10);
        assert_eq!(loot.chance(0.95), 1.0);
        assert!((loot.chance(0.5) - 0.55).abs() < 1e-9);

        assert_eq!(loot.item_count(0.1, 0.0), 0);
        assert_eq!(loot.item_count(0.9, 0.99), 2);
        assert_eq!(loot.item_count(0.5, 0.54), 1);
        assert_eq!(loot.item_count(0.5, 0.56), 0);
    }

    #[test]
    fn loot_rarity_splits_at_half_health() {
        let loot = LootParams::default();
        assert_eq!(loot.rarity(EnemyKind::Monster, 0.49), Rarity::Common);
        assert_eq!(loot.rarity(EnemyKind::Monster, 0.5), Rarity::Uncommon);
        assert_eq!(loot.rarity(EnemyKind::Boss, 0.2), Rarity::Rare);
        assert_eq!(loot.rarity(EnemyKind::Boss, 0.8), Rarity::Epic);
        assert_eq!(loot.rarity(EnemyKind::Titan, 0.2), Rarity::Legendary);
        assert_eq!(loot.rarity(EnemyKind::Titan, 1.0), Rarity::Mythic);
    }
}
