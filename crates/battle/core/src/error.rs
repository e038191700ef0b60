//! Common error infrastructure for battle-core.
//!
//! Domain errors (`SubmitError`, `ResolveError`, `SetupError`) live next to the
//! operations that raise them. This module holds the shared classification
//! types so the runtime can decide how loudly to report each failure.

use crate::state::ParticipantId;

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the caller may retry, possibly with a different action
/// - **Validation**: invalid input that should be rejected without retry
/// - **Internal**: unexpected state inconsistency worth investigating
/// - **Fatal**: the battle's own invariants are corrupted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Retry with the same or an alternative action may succeed.
    ///
    /// Examples: target already eliminated, round still collecting
    Recoverable,

    /// Invalid input, should not retry without changes.
    ///
    /// Examples: duplicate submission, unknown participant
    Validation,

    /// Unexpected state inconsistency.
    ///
    /// Examples: stale round resolution request
    Internal,

    /// Battle state corrupted, cannot continue.
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Contextual information attached to errors for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Participant that triggered the error (if applicable).
    pub participant: Option<ParticipantId>,

    /// Round number at the time of the error.
    pub round: u32,

    /// Optional static message providing additional context.
    pub message: Option<&'static str>,
}

impl ErrorContext {
    /// Creates a new error context for the given round.
    #[must_use]
    pub const fn new(round: u32) -> Self {
        Self {
            participant: None,
            round,
            message: None,
        }
    }

    /// Attaches a participant to this context (builder pattern).
    #[must_use]
    pub const fn with_participant(mut self, participant: ParticipantId) -> Self {
        self.participant = Some(participant);
        self
    }

    /// Attaches a static message to this context (builder pattern).
    #[must_use]
    pub const fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

/// Common trait for all battle-core errors.
///
/// - All error enums should implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait CombatError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns the context information for this error, if available.
    fn context(&self) -> Option<ErrorContext> {
        None
    }

    /// Returns a stable error code for logging and client display.
    fn error_code(&self) -> &'static str;
}
