//! Single attacker-versus-target damage resolution.

use crate::config::DamageParams;

/// Inputs to a single attack.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackInput {
    /// Attacker's effective attack.
    pub attack: u32,
    /// Defense of whoever absorbs the hit (the guard when guarded).
    pub target_defense: u32,
    pub charge_multiplier: f64,
    pub roll_multiplier: f64,
    pub target_is_defending: bool,
    /// Fractional defense bonus; only positive values apply.
    pub target_defense_bonus: f64,
    pub attacker_is_charging: bool,
}

impl AttackInput {
    /// Plain attack: no charge, flat roll, undefended target.
    pub fn new(attack: u32, target_defense: u32) -> Self {
        Self {
            attack,
            target_defense,
            charge_multiplier: 1.0,
            roll_multiplier: 1.0,
            target_is_defending: false,
            target_defense_bonus: 0.0,
            attacker_is_charging: false,
        }
    }

    #[must_use]
    pub fn with_charge(mut self, charge_multiplier: f64) -> Self {
        self.charge_multiplier = charge_multiplier;
        self
    }

    #[must_use]
    pub fn with_roll(mut self, roll_multiplier: f64) -> Self {
        self.roll_multiplier = roll_multiplier;
        self
    }

    #[must_use]
    pub fn defending(mut self, target_is_defending: bool) -> Self {
        self.target_is_defending = target_is_defending;
        self
    }

    #[must_use]
    pub fn with_defense_bonus(mut self, bonus: f64) -> Self {
        self.target_defense_bonus = bonus;
        self
    }
}

/// Result of a single attack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackResolution {
    pub total_power: u32,
    pub effective_defense: u32,
    /// Damage dealt to the attack's target.
    pub final_damage: u32,
    /// Backlash dealt to the attacker. Non-zero only against an active defend.
    pub parry_damage: u32,
    pub is_critical: bool,
}

/// Defense after the defend/unguarded rule and any bonus.
///
/// Defending doubles defense, otherwise it is halved with integer division.
pub fn effective_defense(defense: u32, defending: bool, bonus: f64, params: &DamageParams) -> u32 {
    let base = if defending {
        (f64::from(defense) * params.defend_multiplier) as u32
    } else {
        defense / params.unguarded_defense_divisor.max(1)
    };

    if bonus > 0.0 {
        (f64::from(base) * (1.0 + bonus)) as u32
    } else {
        base
    }
}

/// Resolves one attack.
///
/// # Formula
///
/// ```text
/// charge = charge_multiplier * (2 if attacker_is_charging)
/// power  = int(attack * charge * roll_multiplier)
/// if crit_roll <= crit_chance: power = int(power * 1.5)
/// defense = defending ? int(defense * 2.0) : defense // 2, then * (1 + bonus)
///
/// power >  defense -> damage = max(1, power - defense)
/// power == defense -> perfect block
/// power <  defense -> parry = max(1, defense - power) when defending
/// ```
///
/// `crit_roll` is a d100 result; the hit is critical when it falls within the
/// configured chance.
pub fn resolve_attack(input: &AttackInput, crit_roll: u32, params: &DamageParams) -> AttackResolution {
    let mut charge = input.charge_multiplier;
    if input.attacker_is_charging {
        charge *= params.charging_attack_bonus;
    }
    let mut total_power = (f64::from(input.attack) * charge * input.roll_multiplier) as u32;

    let is_critical = crit_roll <= params.critical_chance_percent;
    if is_critical {
        total_power = (f64::from(total_power) * params.critical_multiplier) as u32;
    }

    let effective_defense = effective_defense(
        input.target_defense,
        input.target_is_defending,
        input.target_defense_bonus,
        params,
    );

    let (final_damage, parry_damage) = if total_power > effective_defense {
        ((total_power - effective_defense).max(1), 0)
    } else if total_power == effective_defense {
        (0, 0)
    } else if input.target_is_defending {
        (0, (effective_defense - total_power).max(1))
    } else {
        (0, 0)
    };

    AttackResolution {
        total_power,
        effective_defense,
        final_damage,
        parry_damage,
        is_critical,
    }
}
