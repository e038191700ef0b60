//! Error types raised by pet store implementations.

use thiserror::Error;

use battle_core::ParticipantId;

/// Errors surfaced by pet store implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("pet store lock was poisoned")]
    LockPoisoned,

    #[error("no pet record for participant {id}")]
    NotFound { id: ParticipantId },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("pet store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
