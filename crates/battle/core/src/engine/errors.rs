//! Error types for round resolution and forfeits.

use crate::error::{CombatError, ErrorContext, ErrorSeverity};
use crate::state::{BattlePhase, SideId};

/// Errors surfaced when asking the engine to open or resolve a round.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("battle already started")]
    AlreadyStarted,

    #[error("battle has not started")]
    NotStarted,

    #[error("battle is over")]
    Terminated,

    #[error("round {requested} already resolved (current round {current})")]
    StaleRound { requested: u32, current: u32 },

    #[error("round {round} still waiting on {remaining} submissions")]
    QuorumNotReached { round: u32, remaining: usize },
}

impl CombatError for ResolveError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::QuorumNotReached { .. } => ErrorSeverity::Recoverable,
            Self::AlreadyStarted | Self::NotStarted | Self::Terminated => ErrorSeverity::Validation,
            Self::StaleRound { .. } => ErrorSeverity::Internal,
        }
    }

    fn context(&self) -> Option<ErrorContext> {
        match *self {
            Self::StaleRound { requested, .. } => {
                Some(ErrorContext::new(requested).with_message("stale round"))
            }
            Self::QuorumNotReached { round, .. } => Some(ErrorContext::new(round)),
            Self::AlreadyStarted | Self::NotStarted | Self::Terminated => None,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyStarted => "RESOLVE_ALREADY_STARTED",
            Self::NotStarted => "RESOLVE_NOT_STARTED",
            Self::Terminated => "RESOLVE_TERMINATED",
            Self::StaleRound { .. } => "RESOLVE_STALE_ROUND",
            Self::QuorumNotReached { .. } => "RESOLVE_QUORUM_NOT_REACHED",
        }
    }
}

/// Errors surfaced by an external forfeit request.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ForfeitError {
    #[error("side {side} is not part of this battle")]
    UnknownSide { side: SideId },

    #[error("cannot forfeit while phase is {phase}")]
    NotBetweenRounds { phase: BattlePhase },
}

impl CombatError for ForfeitError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownSide { .. } => ErrorSeverity::Validation,
            Self::NotBetweenRounds { .. } => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownSide { .. } => "FORFEIT_UNKNOWN_SIDE",
            Self::NotBetweenRounds { .. } => "FORFEIT_NOT_BETWEEN_ROUNDS",
        }
    }
}
