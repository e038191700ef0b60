//! Batch resolution of one round.
//!
//! Phase order is fixed because later phases read state written by earlier
//! ones: timeouts, charge, guard, attacks, mutual clashes, monster, cleanup.

use std::collections::{BTreeMap, BTreeSet};

use crate::action::{Action, ActionKind};
use crate::combat::{
    AttackInput, GroupTarget, attack_roll_multiplier, resolve_attack, resolve_group_attack,
};
use crate::env::{BattleEnv, RollContext, compute_seed};
use crate::state::{BattleState, ChargePolicy, ParticipantId, TimeoutPolicy, UndefendedBaseline};

use super::RoundClose;
use super::report::{ClampedField, CombatEvent, HpChange};

/// Output of a resolution pass, before the victory check.
pub(super) struct Resolution {
    pub events: Vec<CombatEvent>,
    pub hp_changes: BTreeMap<ParticipantId, HpChange>,
    pub eliminated: Vec<ParticipantId>,
}

/// Guard target -> defenders, in id order.
type Guards = BTreeMap<ParticipantId, Vec<ParticipantId>>;

pub(super) struct RoundResolver<'s, 'e> {
    state: &'s mut BattleState,
    env: BattleEnv<'e>,
    round: u32,
    events: Vec<CombatEvent>,
    eliminated: Vec<ParticipantId>,
    /// Participants whose banked charge was spent by an attack this round.
    consumed: BTreeSet<ParticipantId>,
}

impl<'s, 'e> RoundResolver<'s, 'e> {
    pub fn new(state: &'s mut BattleState, env: BattleEnv<'e>) -> Self {
        let round = state.round_number;
        Self {
            state,
            env,
            round,
            events: Vec::new(),
            eliminated: Vec::new(),
            consumed: BTreeSet::new(),
        }
    }

    pub fn run(mut self, close: RoundClose) -> Resolution {
        let hp_before: BTreeMap<ParticipantId, u32> = self
            .state
            .participants
            .iter()
            .map(|(id, p)| (*id, p.hp))
            .collect();

        let mut actions = std::mem::take(&mut self.state.pending_actions);
        if close == RoundClose::Timeout {
            self.apply_timeout_defaults(&mut actions);
        }

        self.charge_phase(&actions);
        let guards = self.guard_phase(&actions);
        let clashes = self.attack_phase(&actions, &guards);
        self.clash_phase(&clashes, &guards);
        self.monster_phase();
        self.cleanup();

        let hp_changes = self
            .state
            .participants
            .iter()
            .filter_map(|(id, p)| {
                let before = hp_before.get(id).copied().unwrap_or(p.hp);
                (before != p.hp).then_some((*id, HpChange { before, after: p.hp }))
            })
            .collect();

        Resolution {
            events: self.events,
            hp_changes,
            eliminated: self.eliminated,
        }
    }

    fn seed(&self, participant: ParticipantId, context: RollContext) -> u64 {
        compute_seed(self.state.seed, self.round, participant.raw(), context)
    }

    // ------------------------------------------------------------------
    // Phases
    // ------------------------------------------------------------------

    fn apply_timeout_defaults(&mut self, actions: &mut BTreeMap<ParticipantId, Action>) {
        let missing: Vec<ParticipantId> = self
            .state
            .collecting_from
            .iter()
            .copied()
            .filter(|id| !actions.contains_key(id) && self.state.is_alive(*id))
            .collect();

        for participant in missing {
            let fallback = match self.state.mode.timeout_policy() {
                TimeoutPolicy::Skip => None,
                TimeoutPolicy::RandomAttack => {
                    let enemies = self.state.alive_enemies_of(participant);
                    if enemies.is_empty() {
                        None
                    } else {
                        let idx = self.env.rng().choose_index(
                            self.seed(participant, RollContext::TimeoutTarget),
                            enemies.len(),
                        );
                        Some(Action::Attack { target: enemies[idx] })
                    }
                }
            };
            if let Some(action) = fallback {
                actions.insert(participant, action);
            }
            self.events.push(CombatEvent::TimedOut {
                participant,
                fallback,
            });
        }
    }

    fn charge_phase(&mut self, actions: &BTreeMap<ParticipantId, Action>) {
        for (id, action) in actions {
            if *action == Action::Charge {
                self.charge(*id);
            }
        }
    }

    fn charge(&mut self, id: ParticipantId) {
        let policy = self.state.mode.charge_policy();
        let params = &self.state.config.charge;
        let Some(participant) = self.state.participants.get_mut(&id) else {
            return;
        };
        if !participant.alive {
            return;
        }
        participant.charge_multiplier = match policy {
            ChargePolicy::Doubling => params.double(participant.charge_multiplier),
            ChargePolicy::Progression => params.advance(participant.charge_multiplier),
        };
        participant.charging = true;
        self.events.push(CombatEvent::Charged {
            participant: id,
            multiplier: participant.charge_multiplier,
        });
    }

    fn guard_phase(&mut self, actions: &BTreeMap<ParticipantId, Action>) -> Guards {
        let mut guards = Guards::new();
        for (defender, action) in actions {
            let Action::Defend { target } = action else {
                continue;
            };
            if !self.state.is_alive(*defender) {
                continue;
            }
            // A guard target that is no longer valid becomes self-defense.
            let target = if self.state.is_alive(*target) && self.state.are_allies(*defender, *target) {
                *target
            } else {
                *defender
            };
            if let Some(p) = self.state.participants.get_mut(defender) {
                p.guard_target = Some(target);
            }
            guards.entry(target).or_default().push(*defender);
            self.events.push(CombatEvent::Guarding {
                defender: *defender,
                target,
            });
        }
        guards
    }

    /// Resolves every attack that is not part of a mutual pair and returns the pairs.
    fn attack_phase(
        &mut self,
        actions: &BTreeMap<ParticipantId, Action>,
        guards: &Guards,
    ) -> Vec<(ParticipantId, ParticipantId)> {
        let attacks: Vec<(ParticipantId, ParticipantId)> = actions
            .iter()
            .filter_map(|(id, action)| match action {
                Action::Attack { target } => Some((*id, *target)),
                _ => None,
            })
            .collect();

        let mut clashes = Vec::new();
        let mut in_clash = BTreeSet::new();
        if self.state.mode.resolves_mutual_attacks() {
            for (attacker, target) in &attacks {
                let mutual = actions.get(target) == Some(&Action::Attack { target: *attacker });
                if mutual && attacker < target {
                    clashes.push((*attacker, *target));
                    in_clash.insert(*attacker);
                    in_clash.insert(*target);
                }
            }
        }

        for (attacker, target) in attacks {
            if !in_clash.contains(&attacker) {
                self.standard_attack(attacker, target, guards);
            }
        }
        clashes
    }

    fn clash_phase(&mut self, clashes: &[(ParticipantId, ParticipantId)], guards: &Guards) {
        for (first, second) in clashes {
            match (self.state.is_alive(*first), self.state.is_alive(*second)) {
                (true, true) => self.clash(*first, *second),
                (true, false) => self.standard_attack(*first, *second, guards),
                (false, true) => self.standard_attack(*second, *first, guards),
                (false, false) => {}
            }
        }
    }

    fn monster_phase(&mut self) {
        if !self.state.mode.is_pve() {
            return;
        }
        let Some(monster) = self.state.monster().filter(|m| m.alive) else {
            return;
        };
        let monster_id = monster.id;
        let action = self.env.monster_ai().choose(
            monster,
            self.env.rng(),
            self.seed(monster_id, RollContext::MonsterAction),
        );
        self.events.push(CombatEvent::MonsterAction {
            monster: monster_id,
            action,
        });

        match action {
            ActionKind::Attack => self.monster_attack(monster_id),
            ActionKind::Defend => {
                if let Some(m) = self.state.participants.get_mut(&monster_id) {
                    m.guard_target = Some(monster_id);
                }
            }
            ActionKind::Charge => self.charge(monster_id),
        }
    }

    fn cleanup(&mut self) {
        for participant in self.state.participants.values_mut() {
            participant.guard_target = None;
            participant.charging = false;
            if self.consumed.contains(&participant.id) {
                participant.charge_multiplier = 1.0;
            }

            debug_assert!(participant.hp <= participant.max_hp, "hp above max for {}", participant.id);
            if participant.hp > participant.max_hp {
                participant.hp = participant.max_hp;
                self.events.push(CombatEvent::InvariantClamped {
                    participant: participant.id,
                    field: ClampedField::Hp,
                });
            }
            debug_assert!(participant.charge_multiplier >= 1.0, "charge below 1.0 for {}", participant.id);
            if participant.charge_multiplier.is_nan() || participant.charge_multiplier < 1.0 {
                participant.charge_multiplier = 1.0;
                self.events.push(CombatEvent::InvariantClamped {
                    participant: participant.id,
                    field: ClampedField::ChargeMultiplier,
                });
            }
        }
    }

    // ------------------------------------------------------------------
    // Attacks
    // ------------------------------------------------------------------

    /// Attack against a target, honouring any guard on it.
    fn standard_attack(&mut self, attacker: ParticipantId, intended: ParticipantId, guards: &Guards) {
        if !self.state.is_alive(attacker) {
            return;
        }
        let Some(target) = self.pick_target(attacker, intended) else {
            self.events.push(CombatEvent::Fizzled {
                attacker,
                target: intended,
            });
            return;
        };

        let guard = guards
            .get(&target)
            .and_then(|defenders| defenders.iter().copied().find(|d| self.state.is_alive(*d)));

        let (roll, crit_roll) = self.attack_rolls(attacker);
        let Some(input) = self.attack_input(attacker, target, guard, roll) else {
            return;
        };
        let resolution = resolve_attack(&input, crit_roll, &self.state.config.damage);

        self.consumed.insert(attacker);
        self.events.push(CombatEvent::Attack {
            attacker,
            target,
            roll,
            guarded_by: guard,
            resolution,
        });

        self.strike(target, resolution.final_damage, &[attacker]);
        if let Some(defender) = guard {
            // Backlash hits the attacker; the guard is credited with it.
            self.strike(attacker, resolution.parry_damage, &[defender]);
        }
    }

    /// Both sides of a mutual pair strike at once, each against zero defense.
    fn clash(&mut self, first: ParticipantId, second: ParticipantId) {
        let (first_roll, first_crit) = self.attack_rolls(first);
        let (second_roll, second_crit) = self.attack_rolls(second);

        let params = self.state.config.damage;
        let unguarded = |state: &BattleState, id: ParticipantId, roll: u32| {
            state.participant(id).map(|p| {
                AttackInput::new(p.attack(), 0)
                    .with_charge(p.charge_multiplier)
                    .with_roll(attack_roll_multiplier(roll))
            })
        };
        let (Some(first_input), Some(second_input)) = (
            unguarded(&*self.state, first, first_roll),
            unguarded(&*self.state, second, second_roll),
        ) else {
            return;
        };
        let first_hit = resolve_attack(&first_input, first_crit, &params);
        let second_hit = resolve_attack(&second_input, second_crit, &params);

        self.consumed.insert(first);
        self.consumed.insert(second);
        self.events.push(CombatEvent::MutualClash {
            first,
            second,
            first_roll,
            second_roll,
            first_hit,
            second_hit,
        });

        self.strike(second, first_hit.final_damage, &[first]);
        self.strike(first, second_hit.final_damage, &[second]);
    }

    fn monster_attack(&mut self, monster_id: ParticipantId) {
        let roll = self
            .env
            .rng()
            .roll_d20(self.seed(monster_id, RollContext::MonsterAttackRoll));
        let Some(monster) = self.state.participant(monster_id) else {
            return;
        };
        let (attack, charge) = (monster.attack(), monster.charge_multiplier);

        let targets: BTreeMap<ParticipantId, GroupTarget> = self
            .state
            .alive_players()
            .map(|p| {
                (
                    p.id,
                    GroupTarget {
                        guarding: p.guard_target,
                        defense: p.defense(),
                        defense_bonus: 0.0,
                        is_charging: p.charging,
                    },
                )
            })
            .collect();

        let hits = resolve_group_attack(
            attack,
            charge,
            attack_roll_multiplier(roll),
            &targets,
            self.state.mode.undefended_baseline(),
            &self.state.config.damage,
        );

        self.consumed.insert(monster_id);
        self.events.push(CombatEvent::GroupAttack {
            monster: monster_id,
            roll,
            hits: hits.clone(),
        });

        for (target, hit) in hits {
            self.strike(target, hit.final_damage, &[monster_id]);
            if !hit.defenders.is_empty() {
                self.strike(monster_id, hit.parry_damage, &hit.defenders);
            }
        }
    }

    fn attack_rolls(&self, attacker: ParticipantId) -> (u32, u32) {
        let rng = self.env.rng();
        (
            rng.roll_d20(self.seed(attacker, RollContext::AttackRoll)),
            rng.roll_d100(self.seed(attacker, RollContext::Critical)),
        )
    }

    fn attack_input(
        &self,
        attacker: ParticipantId,
        target: ParticipantId,
        guard: Option<ParticipantId>,
        roll: u32,
    ) -> Option<AttackInput> {
        let attacker = self.state.participant(attacker)?;
        let input = AttackInput {
            attack: attacker.attack(),
            target_defense: 0,
            charge_multiplier: attacker.charge_multiplier,
            roll_multiplier: attack_roll_multiplier(roll),
            target_is_defending: false,
            target_defense_bonus: 0.0,
            // Charging participants do not attack in the round they charge.
            attacker_is_charging: false,
        };

        Some(match guard {
            Some(defender) => AttackInput {
                target_defense: self.state.participant(defender)?.defense(),
                target_is_defending: true,
                ..input
            },
            None => AttackInput {
                target_defense: match self.state.mode.undefended_baseline() {
                    UndefendedBaseline::HalvedDefense => self.state.participant(target)?.defense(),
                    UndefendedBaseline::ZeroDefense => 0,
                },
                ..input
            },
        })
    }

    /// The intended target if still standing, otherwise a random alive enemy
    /// in modes that retarget.
    fn pick_target(&mut self, attacker: ParticipantId, intended: ParticipantId) -> Option<ParticipantId> {
        if self.state.is_alive(intended) {
            return Some(intended);
        }
        if !self.state.mode.retargets_fallen() {
            return None;
        }
        let enemies = self.state.alive_enemies_of(attacker);
        if enemies.is_empty() {
            return None;
        }
        let idx = self
            .env
            .rng()
            .choose_index(self.seed(attacker, RollContext::Retarget), enemies.len());
        let to = enemies[idx];
        self.events.push(CombatEvent::Retargeted {
            attacker,
            from: intended,
            to,
        });
        Some(to)
    }

    // ------------------------------------------------------------------
    // Damage bookkeeping
    // ------------------------------------------------------------------

    /// Applies damage to `victim`. `sources` share the damage-dealt credit;
    /// the first source takes the kill.
    fn strike(&mut self, victim: ParticipantId, amount: u32, sources: &[ParticipantId]) {
        let Some(&killer) = sources.first() else {
            return;
        };
        if amount == 0 {
            return;
        }
        let Some(target) = self.state.participants.get_mut(&victim) else {
            return;
        };
        if !target.alive {
            return;
        }
        for source in &sources[1..] {
            if *source != victim {
                target.ledger.damaged_by.insert(*source);
            }
        }
        let killed = target.take_damage(amount, killer);
        let assisted: Vec<ParticipantId> = if killed {
            target
                .ledger
                .damaged_by
                .iter()
                .copied()
                .filter(|id| *id != killer)
                .collect()
        } else {
            Vec::new()
        };

        let share = u64::from(amount) / sources.len() as u64;
        for source in sources {
            if let Some(p) = self.state.participants.get_mut(source) {
                p.ledger.damage_dealt += share;
            }
        }

        if killed {
            if killer != victim
                && let Some(p) = self.state.participants.get_mut(&killer)
            {
                p.ledger.kills += 1;
            }
            for id in assisted {
                if let Some(p) = self.state.participants.get_mut(&id) {
                    p.ledger.assists += 1;
                }
            }
            self.eliminated.push(victim);
            self.events.push(CombatEvent::Eliminated {
                participant: victim,
                by: killer,
            });
        }
    }
}
