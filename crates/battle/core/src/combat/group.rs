//! Monster attack against a whole party.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::DamageParams;
use crate::state::{ParticipantId, UndefendedBaseline};

/// A party member exposed to a group attack.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroupTarget {
    /// Who this member is defending this round, if they chose Defend.
    pub guarding: Option<ParticipantId>,
    pub defense: u32,
    pub defense_bonus: f64,
    pub is_charging: bool,
}

/// Outcome of a group attack for one target.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupHit {
    /// Damage dealt to this target.
    pub final_damage: u32,
    /// Backlash dealt to the monster by this target's guards.
    pub parry_damage: u32,
    /// Guards that pooled their defense for this target (empty when undefended).
    pub defenders: Vec<ParticipantId>,
}

/// Splits one monster attack across the party.
///
/// Members defending someone are grouped by their guard target. The attack
/// power is divided evenly among the distinct guarded targets, and each guarded
/// target is protected by the summed doubled defense of its guards. Everyone
/// else forms the undefended pool and shares the attack separately; undefended
/// members that charged this round take 50% more.
///
/// Returns a hit for every guarded target and every undefended member.
/// Defenders guarding someone other than themselves are not hit directly.
pub fn resolve_group_attack(
    attack: u32,
    charge_multiplier: f64,
    roll_multiplier: f64,
    targets: &BTreeMap<ParticipantId, GroupTarget>,
    baseline: UndefendedBaseline,
    params: &DamageParams,
) -> BTreeMap<ParticipantId, GroupHit> {
    let total_power = (f64::from(attack) * charge_multiplier * roll_multiplier) as u32;

    let mut groups: BTreeMap<ParticipantId, Vec<ParticipantId>> = BTreeMap::new();
    for (id, target) in targets {
        if let Some(guarded) = target.guarding {
            groups.entry(guarded).or_default().push(*id);
        }
    }
    let guarded: BTreeSet<ParticipantId> = groups.keys().copied().collect();

    let mut hits = BTreeMap::new();

    if !groups.is_empty() {
        let per_target = (total_power / groups.len() as u32).max(1);
        for (target_id, defenders) in groups {
            let pooled: u32 = defenders
                .iter()
                .filter_map(|id| targets.get(id))
                .map(|guard| {
                    let doubled = (f64::from(guard.defense) * params.defend_multiplier) as u32;
                    if guard.defense_bonus > 0.0 {
                        (f64::from(doubled) * (1.0 + guard.defense_bonus)) as u32
                    } else {
                        doubled
                    }
                })
                .sum();

            let (final_damage, parry_damage) = if per_target > pooled {
                ((per_target - pooled).max(1), 0)
            } else if per_target == pooled {
                (0, 0)
            } else {
                (0, (pooled - per_target).max(1))
            };

            hits.insert(
                target_id,
                GroupHit {
                    final_damage,
                    parry_damage,
                    defenders,
                },
            );
        }
    }

    let undefended: Vec<(ParticipantId, &GroupTarget)> = targets
        .iter()
        .filter(|(id, target)| target.guarding.is_none() && !guarded.contains(id))
        .map(|(id, target)| (*id, target))
        .collect();

    if !undefended.is_empty() {
        let per_member = (total_power / undefended.len() as u32).max(1);
        for (id, target) in undefended {
            let defense = match baseline {
                UndefendedBaseline::HalvedDefense => {
                    target.defense / params.unguarded_defense_divisor.max(1)
                }
                UndefendedBaseline::ZeroDefense => 0,
            };
            let incoming = if target.is_charging {
                (f64::from(per_member) * params.charging_vulnerability) as u32
            } else {
                per_member
            };
            let final_damage = if incoming > defense {
                (incoming - defense).max(1)
            } else {
                0
            };
            hits.insert(
                id,
                GroupHit {
                    final_damage,
                    parry_damage: 0,
                    defenders: Vec::new(),
                },
            );
        }
    }

    hits
}
