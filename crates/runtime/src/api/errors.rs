//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from session coordination, the pet store and the combat
//! rules so clients can bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

use battle_core::{ForfeitError, SetupError, SubmitError};

use super::handle::BattleId;
pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("session command channel closed")]
    CommandChannelClosed,

    #[error("session reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("session worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("{battle} ended without a result")]
    SessionClosed { battle: BattleId },

    #[error("no active session for {battle}")]
    UnknownBattle { battle: BattleId },

    #[error("session registry lock was poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error(transparent)]
    Forfeit(#[from] ForfeitError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
