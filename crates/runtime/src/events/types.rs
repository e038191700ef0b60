//! Event payloads published by battle sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use battle_core::{BattleSummary, ParticipantId, RoundClose, RoundReport, SideId};

use crate::api::BattleId;

/// Round lifecycle events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RoundEvent {
    /// A round started collecting actions.
    Opened {
        battle: BattleId,
        round: u32,
        /// Participants whose action is awaited.
        expected: Vec<ParticipantId>,
        timeout_secs: u64,
    },
    /// An action was accepted.
    Submitted {
        battle: BattleId,
        round: u32,
        participant: ParticipantId,
        remaining: usize,
    },
    /// A round was resolved.
    Resolved {
        battle: BattleId,
        close: RoundClose,
        report: RoundReport,
    },
}

/// Termination events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutcomeEvent {
    Finished {
        battle: BattleId,
        summary: BattleSummary,
        forfeited_by: Option<SideId>,
        finished_at: DateTime<Utc>,
    },
    /// Rewards were written to the pet store. `failed` lists pets whose record
    /// could not be updated after every retry.
    RewardsSettled {
        battle: BattleId,
        settled: Vec<ParticipantId>,
        failed: Vec<ParticipantId>,
    },
}

impl RoundEvent {
    pub fn battle(&self) -> BattleId {
        match self {
            Self::Opened { battle, .. }
            | Self::Submitted { battle, .. }
            | Self::Resolved { battle, .. } => *battle,
        }
    }
}

impl OutcomeEvent {
    pub fn battle(&self) -> BattleId {
        match self {
            Self::Finished { battle, .. } | Self::RewardsSettled { battle, .. } => *battle,
        }
    }
}
