//! Plain-text rendering of round reports and battle summaries.

use battle_core::{
    Action, BattleOutcome, BattleSummary, CombatEvent, ParticipantId, RoundReport,
};

use crate::driver::Names;

fn name(names: &Names, id: ParticipantId) -> String {
    names.get(&id).cloned().unwrap_or_else(|| id.to_string())
}

pub fn round(report: &RoundReport, names: &Names) -> Vec<String> {
    let mut lines = vec![format!("── Round {} ──", report.round)];
    lines.extend(report.events.iter().map(|e| format!("  {}", event(e, names))));
    for (id, change) in &report.hp_changes {
        lines.push(format!(
            "    {} hp {} -> {}",
            name(names, *id),
            change.before,
            change.after
        ));
    }
    lines
}

pub fn event(event: &CombatEvent, names: &Names) -> String {
    let n = |id: &ParticipantId| name(names, *id);
    match event {
        CombatEvent::TimedOut {
            participant,
            fallback,
        } => match fallback {
            Some(Action::Attack { target }) => {
                format!("{} hesitates, then lashes out at {}", n(participant), n(target))
            }
            _ => format!("{} hesitates and loses the turn", n(participant)),
        },
        CombatEvent::Charged {
            participant,
            multiplier,
        } => format!("{} charges up (x{:.1})", n(participant), multiplier),
        CombatEvent::Guarding { defender, target } if defender == target => {
            format!("{} braces for impact", n(defender))
        }
        CombatEvent::Guarding { defender, target } => {
            format!("{} guards {}", n(defender), n(target))
        }
        CombatEvent::Attack {
            attacker,
            target,
            roll,
            guarded_by,
            resolution,
        } => {
            let mut line = format!(
                "{} hits {} for {} (roll {})",
                n(attacker),
                n(target),
                resolution.final_damage,
                roll
            );
            if resolution.is_critical {
                line.push_str(", critical!");
            }
            if let Some(guard) = guarded_by {
                line.push_str(&format!(" through {}'s guard", n(guard)));
            }
            if resolution.parry_damage > 0 {
                line.push_str(&format!(
                    "; {} takes {} parry damage",
                    n(attacker),
                    resolution.parry_damage
                ));
            }
            line
        }
        CombatEvent::Retargeted { attacker, from, to } => format!(
            "{} finds {} already down and turns on {}",
            n(attacker),
            n(from),
            n(to)
        ),
        CombatEvent::Fizzled { attacker, target } => {
            format!("{}'s attack on {} finds nobody standing", n(attacker), n(target))
        }
        CombatEvent::MutualClash {
            first,
            second,
            first_hit,
            second_hit,
            ..
        } => format!(
            "{} and {} trade blows: {} to {}, {} to {}",
            n(first),
            n(second),
            first_hit.final_damage,
            n(second),
            second_hit.final_damage,
            n(first)
        ),
        CombatEvent::MonsterAction { monster, action } => {
            format!("{} chooses to {}", n(monster), action)
        }
        CombatEvent::GroupAttack {
            monster,
            roll,
            hits,
        } => {
            let parts: Vec<String> = hits
                .iter()
                .map(|(target, hit)| {
                    if hit.defenders.is_empty() {
                        format!("{} takes {}", n(target), hit.final_damage)
                    } else {
                        format!(
                            "{} takes {} behind {} guard(s), parry {}",
                            n(target),
                            hit.final_damage,
                            hit.defenders.len(),
                            hit.parry_damage
                        )
                    }
                })
                .collect();
            format!("{} sweeps the party (roll {}): {}", n(monster), roll, parts.join("; "))
        }
        CombatEvent::Eliminated { participant, by } => {
            format!("{} is knocked out by {}", n(participant), n(by))
        }
        CombatEvent::InvariantClamped { participant, field } => {
            format!("{}'s {} was repaired", n(participant), field)
        }
        CombatEvent::Forfeited { side } => format!("{} forfeits", side),
    }
}

pub fn print_summary(summary: &BattleSummary, names: &Names) {
    println!();
    match summary.outcome {
        BattleOutcome::Won { side } => {
            println!("{} wins after {} rounds ({})", side, summary.rounds, summary.mode)
        }
        BattleOutcome::Draw => println!("Draw after {} rounds ({})", summary.rounds, summary.mode),
    }
    for reward in summary.rewards.values() {
        let loot = reward
            .loot
            .map(|l| format!("{}x {}", l.count, l.rarity))
            .unwrap_or_else(|| "none".to_string());
        println!(
            "  {:<8} {:<7} hp {:>3}/{:<3} +{} xp  +{} currency  loot {}",
            name(names, reward.participant),
            reward.outcome,
            reward.final_hp,
            reward.max_hp,
            reward.xp,
            reward.currency,
            loot
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::{AttackResolution, HpChange};
    use std::collections::BTreeMap;

    fn names() -> Names {
        BTreeMap::from([
            (ParticipantId(1), "Sparky".to_string()),
            (ParticipantId::MONSTER, "Scrap Drone".to_string()),
        ])
    }

    #[test]
    fn attacks_mention_guards_and_parries() {
        let line = event(
            &CombatEvent::Attack {
                attacker: ParticipantId::MONSTER,
                target: ParticipantId(1),
                roll: 8,
                guarded_by: Some(ParticipantId(1)),
                resolution: AttackResolution {
                    total_power: 10,
                    effective_defense: 40,
                    final_damage: 0,
                    parry_damage: 15,
                    is_critical: false,
                },
            },
            &names(),
        );
        assert_eq!(
            line,
            "Scrap Drone hits Sparky for 0 (roll 8) through Sparky's guard; Scrap Drone takes 15 parry damage"
        );
    }

    #[test]
    fn unknown_ids_fall_back_to_the_raw_id() {
        let line = event(
            &CombatEvent::Guarding {
                defender: ParticipantId(7),
                target: ParticipantId(7),
            },
            &names(),
        );
        assert_eq!(line, "7 braces for impact");
    }

    #[test]
    fn rounds_list_hp_changes() {
        let report = RoundReport {
            round: 2,
            events: vec![CombatEvent::Eliminated {
                participant: ParticipantId::MONSTER,
                by: ParticipantId(1),
            }],
            hp_changes: BTreeMap::from([(
                ParticipantId::MONSTER,
                HpChange { before: 22, after: 0 },
            )]),
            eliminated: vec![ParticipantId::MONSTER],
            battle_over: true,
            outcome: None,
        };
        let lines = round(&report, &names());
        assert_eq!(lines[0], "── Round 2 ──");
        assert_eq!(lines[1], "  Scrap Drone is knocked out by Sparky");
        assert_eq!(lines[2], "    Scrap Drone hp 22 -> 0");
    }
}
