//! Round actions and the submission contract.
//!
//! Each alive player submits exactly one [`Action`] per round. Submission is
//! validated against the current state and rejected (never overwritten) when
//! the participant already has a pending action.

use crate::error::{CombatError, ErrorContext, ErrorSeverity};
use crate::state::{BattlePhase, BattleState, ParticipantId};

/// Action chosen by a participant for one round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Action {
    /// Strike an enemy.
    Attack { target: ParticipantId },
    /// Guard an ally, or yourself, for this round.
    Defend { target: ParticipantId },
    /// Escalate the multiplier for the next attack.
    Charge,
}

impl Action {
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Attack { .. } => ActionKind::Attack,
            Self::Defend { .. } => ActionKind::Defend,
            Self::Charge => ActionKind::Charge,
        }
    }

    pub const fn target(&self) -> Option<ParticipantId> {
        match self {
            Self::Attack { target } | Self::Defend { target } => Some(*target),
            Self::Charge => None,
        }
    }
}

/// Action kind without its target; also the monster policy's vocabulary.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ActionKind {
    Attack,
    Defend,
    Charge,
}

/// Result of an accepted (or silently dropped) submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitStatus {
    /// Stored; still waiting on `remaining` participants.
    Pending { remaining: usize },
    /// Stored; every expected participant has submitted and the round is
    /// ready to resolve. Returned exactly once per round.
    QuorumReached,
    /// Battle already over. Late submissions are dropped.
    Ignored,
}

/// Why an action's target is not acceptable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum InvalidTarget {
    Unknown,
    Eliminated,
    NotAnEnemy,
    NotAnAlly,
}

/// Rejected submissions. The round is left untouched.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("round {round} is not collecting actions (phase {phase})")]
    NotCollecting { round: u32, phase: BattlePhase },

    #[error("participant {participant} is not expected to act in round {round}")]
    NotExpected { participant: ParticipantId, round: u32 },

    #[error("participant {participant} already chose an action for round {round}")]
    DuplicateSubmission { participant: ParticipantId, round: u32 },

    #[error("invalid action from {participant}: target {target} is {reason}")]
    InvalidAction {
        participant: ParticipantId,
        round: u32,
        target: ParticipantId,
        reason: InvalidTarget,
    },
}

impl CombatError for SubmitError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotCollecting { .. } | Self::InvalidAction { .. } => ErrorSeverity::Recoverable,
            Self::NotExpected { .. } | Self::DuplicateSubmission { .. } => {
                ErrorSeverity::Validation
            }
        }
    }

    fn context(&self) -> Option<ErrorContext> {
        Some(match *self {
            Self::NotCollecting { round, .. } => {
                ErrorContext::new(round).with_message("round is not collecting")
            }
            Self::NotExpected { participant, round }
            | Self::DuplicateSubmission { participant, round } => {
                ErrorContext::new(round).with_participant(participant)
            }
            Self::InvalidAction {
                participant,
                round,
                reason,
                ..
            } => ErrorContext::new(round)
                .with_participant(participant)
                .with_message(reason.into()),
        })
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotCollecting { .. } => "SUBMIT_NOT_COLLECTING",
            Self::NotExpected { .. } => "SUBMIT_NOT_EXPECTED",
            Self::DuplicateSubmission { .. } => "SUBMIT_DUPLICATE",
            Self::InvalidAction { .. } => "SUBMIT_INVALID_ACTION",
        }
    }
}

/// Checks the action's target against the current state.
pub fn validate_target(
    state: &BattleState,
    actor: ParticipantId,
    action: &Action,
) -> Result<(), InvalidTarget> {
    let Some(target) = action.target() else {
        return Ok(());
    };
    let Some(target_state) = state.participant(target) else {
        return Err(InvalidTarget::Unknown);
    };
    if !target_state.alive {
        return Err(InvalidTarget::Eliminated);
    }
    match action {
        Action::Attack { .. } if !state.are_enemies(actor, target) => Err(InvalidTarget::NotAnEnemy),
        Action::Defend { .. } if !state.are_allies(actor, target) => Err(InvalidTarget::NotAnAlly),
        _ => Ok(()),
    }
}
