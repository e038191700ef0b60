//! Plays every seat of a battle with a fixed script.

use std::collections::BTreeMap;

use anyhow::Result;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use battle_core::{Action, BattleState, BattleSummary, ParticipantId};
use battle_runtime::{BattleHandle, Event, RoundEvent, Topic};

use crate::narrate;

pub type Names = BTreeMap<ParticipantId, String>;

pub fn names(state: &BattleState) -> Names {
    state
        .participants
        .values()
        .map(|p| (p.id, p.name.clone()))
        .collect()
}

/// Charge in round 1, guard yourself below 30% HP, otherwise attack the
/// first standing enemy.
pub fn scripted_action(state: &BattleState, id: ParticipantId) -> Action {
    let Some(me) = state.participant(id) else {
        return Action::Charge;
    };
    if state.round_number == 1 {
        return Action::Charge;
    }
    if u64::from(me.hp) * 10 < u64::from(me.max_hp) * 3 {
        return Action::Defend { target: id };
    }
    match state
        .participants
        .values()
        .find(|p| p.alive && p.side != me.side)
    {
        Some(enemy) => Action::Attack { target: enemy.id },
        None => Action::Defend { target: id },
    }
}

/// Submits scripted actions round after round, narrating each resolution.
pub async fn play(handle: &BattleHandle) -> Result<BattleSummary> {
    let mut round_rx = handle.subscribe(Topic::Round);
    let names = names(&handle.query_state().await?);

    loop {
        let state = handle.query_state().await?;
        if state.is_terminal() {
            break;
        }

        let round = state.round_number;
        for &id in &state.collecting_from {
            if state.pending_actions.contains_key(&id) {
                continue;
            }
            let action = scripted_action(&state, id);
            debug!(target: "sim::driver", round, participant = %id, ?action, "submitting");
            handle.submit(id, action).await?;
        }

        wait_for_round(&mut round_rx, round, &names).await;
    }

    Ok(handle.wait_finished().await?)
}

async fn wait_for_round(rx: &mut broadcast::Receiver<Event>, round: u32, names: &Names) {
    loop {
        match rx.recv().await {
            Ok(Event::Round(RoundEvent::Resolved { report, .. })) if report.round == round => {
                for line in narrate::round(&report, names) {
                    println!("{}", line);
                }
                return;
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!(target: "sim::driver", skipped, "narration fell behind");
            }
            Err(RecvError::Closed) => return,
        }
    }
}
