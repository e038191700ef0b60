//! Writes battle rewards back to the pet store.

use std::sync::Arc;

use tokio::time::{Duration, sleep};
use tracing::{debug, info, warn};

use battle_core::{BattleSummary, ParticipantId, ParticipantReward};

use crate::api::BattleId;
use crate::repository::{PetStore, Result};

const MAX_ATTEMPTS: u32 = 3;
const BASE_DELAY_MS: u64 = 100;

/// Pets whose records were updated, and pets whose update was dropped.
#[derive(Debug, Default)]
pub(crate) struct Settlement {
    pub settled: Vec<ParticipantId>,
    pub failed: Vec<ParticipantId>,
}

pub(crate) async fn settle_rewards(
    store: &Arc<dyn PetStore>,
    battle: BattleId,
    summary: &BattleSummary,
) -> Settlement {
    let mut settlement = Settlement::default();
    for (id, reward) in &summary.rewards {
        if settle_with_retry(store, battle, *id, reward).await {
            settlement.settled.push(*id);
        } else {
            settlement.failed.push(*id);
        }
    }
    settlement
}

/// Load, apply and save one reward, retrying with exponential backoff.
/// Returns `false` once every attempt failed.
async fn settle_with_retry(
    store: &Arc<dyn PetStore>,
    battle: BattleId,
    id: ParticipantId,
    reward: &ParticipantReward,
) -> bool {
    for attempt in 0..MAX_ATTEMPTS {
        match settle_once(store, battle, id, reward).await {
            Ok(()) => {
                if attempt > 0 {
                    info!(
                        target: "runtime::rewards",
                        battle = %battle,
                        participant = %id,
                        "reward saved after {} retries",
                        attempt
                    );
                }
                return true;
            }
            Err(e) if attempt + 1 < MAX_ATTEMPTS => {
                let delay = Duration::from_millis(BASE_DELAY_MS * (1 << attempt));
                warn!(
                    target: "runtime::rewards",
                    battle = %battle,
                    participant = %id,
                    "failed to save reward (attempt {}/{}): {}. Retrying in {:?}...",
                    attempt + 1,
                    MAX_ATTEMPTS,
                    e,
                    delay
                );
                sleep(delay).await;
            }
            Err(e) => {
                warn!(
                    target: "runtime::rewards",
                    battle = %battle,
                    participant = %id,
                    xp = reward.xp,
                    currency = reward.currency,
                    "dropping reward after {} attempts: {}",
                    MAX_ATTEMPTS,
                    e
                );
            }
        }
    }
    false
}

async fn settle_once(
    store: &Arc<dyn PetStore>,
    battle: BattleId,
    id: ParticipantId,
    reward: &ParticipantReward,
) -> Result<()> {
    let mut record = store.load(id).await?;
    if !record.apply_reward(battle, reward) {
        debug!(
            target: "runtime::rewards",
            battle = %battle,
            participant = %id,
            "reward already applied"
        );
        return Ok(());
    }
    store.save(id, &record).await?;
    Ok(())
}
