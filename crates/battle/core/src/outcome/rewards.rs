//! Reward tables applied when a battle terminates.

use std::collections::BTreeMap;

use crate::env::{RngOracle, RollContext, compute_seed};
use crate::state::{BattleState, Participant, ParticipantId};

use super::{BattleOutcome, BattleSummary, LootAward, Outcome, ParticipantReward};

/// Computes every player's reward for a finished battle.
///
/// PvE survivors of a victory earn the full reward as both XP and currency
/// plus health-scaled loot; fallen party members and defeated parties earn
/// participation XP only. PvP earns XP from rounds, kills, assists and damage.
pub fn summarize(state: &BattleState, outcome: BattleOutcome, rng: &dyn RngOracle) -> BattleSummary {
    let rewards = if state.mode.is_pve() {
        pve_rewards(state, outcome, rng)
    } else {
        pvp_rewards(state, outcome)
    };

    BattleSummary {
        mode: state.mode,
        outcome,
        rounds: state.round_number,
        rewards,
    }
}

fn base_reward(participant: &Participant, outcome: BattleOutcome) -> ParticipantReward {
    ParticipantReward {
        participant: participant.id,
        outcome: outcome.for_side(participant.side),
        final_hp: participant.hp,
        max_hp: participant.max_hp,
        xp: 0,
        currency: 0,
        loot: None,
    }
}

fn pve_rewards(
    state: &BattleState,
    outcome: BattleOutcome,
    rng: &dyn RngOracle,
) -> BTreeMap<ParticipantId, ParticipantReward> {
    let params = &state.config.rewards;
    let (total, kind) = match (state.encounter, state.monster()) {
        (Some(encounter), Some(monster)) => (
            params.victory_total(monster.max_hp, encounter.rarity, encounter.kind),
            encounter.kind,
        ),
        _ => return BTreeMap::new(),
    };
    let participation = params.participation_xp(total);

    state
        .participants
        .values()
        .filter(|p| p.is_player())
        .map(|player| {
            let mut reward = base_reward(player, outcome);
            if reward.outcome == Outcome::Victory && player.alive {
                reward.xp = total;
                reward.currency = total;

                let fraction = player.health_fraction();
                let draw = rng.unit(compute_seed(
                    state.seed,
                    state.round_number,
                    player.id.raw(),
                    RollContext::Loot,
                ));
                let count = params.loot.item_count(fraction, draw);
                reward.loot = (count > 0).then(|| LootAward {
                    rarity: params.loot.rarity(kind, fraction),
                    count,
                });
            } else {
                reward.xp = participation;
            }
            (player.id, reward)
        })
        .collect()
}

fn pvp_rewards(state: &BattleState, outcome: BattleOutcome) -> BTreeMap<ParticipantId, ParticipantReward> {
    let xp = &state.config.rewards.pvp;
    let rounds = u64::from(state.round_number);
    let win_bonus = if state.mode.earns_solo_win_bonus() {
        xp.solo_win_bonus
    } else {
        xp.team_win_bonus
    };

    state
        .participants
        .values()
        .filter(|p| p.is_player())
        .map(|player| {
            let mut reward = base_reward(player, outcome);
            let ledger = &player.ledger;
            let damage_xp = (ledger.damage_dealt / xp.damage_divisor.max(1)).min(xp.damage_cap);
            reward.xp = xp.base
                + rounds * xp.per_round
                + u64::from(ledger.kills) * xp.per_kill
                + u64::from(ledger.assists) * xp.per_assist
                + damage_xp;
            if reward.outcome == Outcome::Victory {
                reward.xp += win_bonus;
            }
            (player.id, reward)
        })
        .collect()
}
