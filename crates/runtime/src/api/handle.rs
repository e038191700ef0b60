//! Cloneable façade for issuing commands to one battle session.
//!
//! [`BattleHandle`] hides channel plumbing and offers async helpers for
//! submitting actions, querying state, and streaming events from specific topics.
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::trace;

use battle_core::{Action, BattleState, BattleSummary, ParticipantId, SideId, SubmitStatus};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::workers::Command;

/// Identifier of one battle session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BattleId(pub u64);

impl fmt::Display for BattleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "battle-{:08x}-{}", self.0 >> 32, self.0 & u64::from(u32::MAX))
    }
}

/// Final state published by a session when its battle terminates.
pub(crate) type Finished = watch::Receiver<Option<Arc<BattleState>>>;

/// Client-facing handle to one battle session.
#[derive(Clone)]
pub struct BattleHandle {
    battle: BattleId,
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
    finished_rx: Finished,
}

impl BattleHandle {
    pub(crate) fn new(
        battle: BattleId,
        command_tx: mpsc::Sender<Command>,
        event_bus: EventBus,
        finished_rx: Finished,
    ) -> Self {
        Self {
            battle,
            command_tx,
            event_bus,
            finished_rx,
        }
    }

    pub fn id(&self) -> BattleId {
        self.battle
    }

    /// Submit one participant's action for the current round.
    ///
    /// Submissions that arrive after the battle ended are acknowledged with
    /// [`SubmitStatus::Ignored`].
    pub async fn submit(&self, participant: ParticipantId, action: Action) -> Result<SubmitStatus> {
        let (reply_tx, reply_rx) = oneshot::channel();

        let sent = self
            .command_tx
            .send(Command::Submit {
                participant,
                action,
                reply: reply_tx,
            })
            .await;

        // A closed channel is expected once the session has terminated.
        match sent {
            Ok(()) => match reply_rx.await {
                Ok(result) => return result,
                Err(error) if !self.is_finished() => {
                    return Err(RuntimeError::ReplyChannelClosed(error));
                }
                Err(_) => {}
            },
            Err(_) if !self.is_finished() => return Err(RuntimeError::CommandChannelClosed),
            Err(_) => {}
        }

        trace!(
            target: "runtime::session",
            battle = %self.battle,
            participant = %participant,
            "late submission after battle end"
        );
        Ok(SubmitStatus::Ignored)
    }

    /// Query the current battle state (read-only snapshot).
    ///
    /// After the battle ended this returns the final state.
    pub async fn query_state(&self) -> Result<BattleState> {
        if let Some(state) = self.final_state() {
            return Ok(state.as_ref().clone());
        }

        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::QueryState { reply: reply_tx })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Surrender on behalf of `side`. Only accepted between rounds.
    pub async fn forfeit(&self, side: SideId) -> Result<BattleSummary> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Forfeit {
                side,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)?
    }

    /// Stop the session without settling rewards.
    pub(crate) async fn abort(&self) -> Result<()> {
        self.command_tx
            .send(Command::Abort)
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Round` - Round opened, submissions, resolved reports
    /// - `Topic::Outcome` - Termination and reward settlement
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Wait until the battle terminates and return its summary.
    pub async fn wait_finished(&self) -> Result<BattleSummary> {
        let mut finished_rx = self.finished_rx.clone();
        let state = finished_rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| RuntimeError::SessionClosed {
                battle: self.battle,
            })?
            .clone();

        state
            .and_then(|state| state.summary.clone())
            .ok_or(RuntimeError::SessionClosed {
                battle: self.battle,
            })
    }

    pub fn is_finished(&self) -> bool {
        self.finished_rx.borrow().is_some()
    }

    fn final_state(&self) -> Option<Arc<BattleState>> {
        self.finished_rx.borrow().clone()
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}

impl fmt::Debug for BattleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BattleHandle")
            .field("battle", &self.battle)
            .field("finished", &self.is_finished())
            .finish_non_exhaustive()
    }
}
