//! Session worker that owns the authoritative [`battle_core::BattleState`] of one battle.
//!
//! Receives commands from [`crate::BattleHandle`], drives the round protocol
//! through [`BattleEngine`], closes each round on quorum or when its deadline
//! passes, and publishes events to the session's EventBus.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Duration, Instant, sleep_until};
use tracing::{debug, info, trace, warn};

use battle_core::{
    Action, BattleEngine, BattleEnv, BattleState, BattleSummary, CombatError, MonsterPolicy,
    ParticipantId, RngOracle, RoundClose, SideId, SubmitStatus, TimeoutPolicy,
};

use super::rewards::settle_rewards;
use crate::api::{BattleId, Result, RuntimeError};
use crate::events::{Event, EventBus, OutcomeEvent, RoundEvent};
use crate::registry::SessionRegistry;
use crate::repository::PetStore;

/// Commands that can be sent to a session worker
pub(crate) enum Command {
    /// Record one participant's action for the current round.
    Submit {
        participant: ParticipantId,
        action: Action,
        reply: oneshot::Sender<Result<SubmitStatus>>,
    },
    /// Query the current battle state (read-only).
    QueryState { reply: oneshot::Sender<BattleState> },
    /// Surrender on behalf of a side.
    Forfeit {
        side: SideId,
        reply: oneshot::Sender<Result<BattleSummary>>,
    },
    /// Stop without settling rewards.
    Abort,
}

/// Collaborators shared by every session of one runtime.
#[derive(Clone)]
pub(crate) struct SessionContext {
    pub store: Arc<dyn PetStore>,
    pub rng: Arc<dyn RngOracle>,
    pub monster_ai: Arc<dyn MonsterPolicy>,
    pub registry: SessionRegistry,
}

/// Background task that runs one battle to completion.
pub(crate) struct SessionWorker {
    battle: BattleId,
    state: BattleState,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    context: SessionContext,
    finished_tx: watch::Sender<Option<Arc<BattleState>>>,
    round_timeout: Duration,
    deadline: Instant,
    /// Consecutive rounds whose deadline passed with no submissions.
    idle_rounds: u32,
    forfeited_by: Option<SideId>,
}

impl SessionWorker {
    pub fn new(
        battle: BattleId,
        state: BattleState,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
        context: SessionContext,
        finished_tx: watch::Sender<Option<Arc<BattleState>>>,
        round_timeout: Duration,
    ) -> Self {
        Self {
            battle,
            state,
            command_rx,
            event_bus,
            context,
            finished_tx,
            round_timeout,
            deadline: Instant::now() + round_timeout,
            idle_rounds: 0,
            forfeited_by: None,
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        if let Err(e) = BattleEngine::new(&mut self.state).start() {
            warn!(target: "runtime::session", battle = %self.battle, "cannot start battle: {}", e);
            self.deregister();
            return;
        }
        info!(
            target: "runtime::session",
            battle = %self.battle,
            mode = %self.state.mode,
            participants = self.state.participants.len(),
            "battle started"
        );
        self.open_round();

        let mut commands_open = true;
        while !self.state.is_terminal() {
            let deadline = self.deadline;
            tokio::select! {
                cmd = self.command_rx.recv(), if commands_open => match cmd {
                    Some(Command::Abort) => {
                        info!(target: "runtime::session", battle = %self.battle, "session aborted");
                        self.deregister();
                        return;
                    }
                    Some(cmd) => self.handle_command(cmd),
                    None => {
                        commands_open = false;
                        if self.skips_idle_players() {
                            info!(
                                target: "runtime::session",
                                battle = %self.battle,
                                "all handles dropped, forfeiting the party"
                            );
                            self.forfeit_party();
                        } else {
                            debug!(
                                target: "runtime::session",
                                battle = %self.battle,
                                "all handles dropped, rounds will close on timeout"
                            );
                        }
                    }
                },
                _ = sleep_until(deadline) => self.on_deadline(),
            }
        }

        self.finish().await;
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Submit {
                participant,
                action,
                reply,
            } => {
                let result = self.handle_submit(participant, action);
                let quorum = matches!(result, Ok(SubmitStatus::QuorumReached));
                if reply.send(result).is_err() {
                    debug!("Submit reply channel closed (caller dropped)");
                }
                if quorum {
                    self.close_round(RoundClose::Quorum);
                }
            }
            Command::QueryState { reply } => {
                if reply.send(self.state.clone()).is_err() {
                    debug!("QueryState reply channel closed (caller dropped)");
                }
            }
            Command::Forfeit { side, reply } => {
                let result = self.handle_forfeit(side);
                if reply.send(result).is_err() {
                    debug!("Forfeit reply channel closed (caller dropped)");
                }
            }
            Command::Abort => {}
        }
    }

    fn handle_submit(&mut self, participant: ParticipantId, action: Action) -> Result<SubmitStatus> {
        let round = self.state.round_number;
        match BattleEngine::new(&mut self.state).submit(participant, action) {
            Ok(SubmitStatus::Ignored) => {
                trace!(
                    target: "runtime::session",
                    battle = %self.battle,
                    participant = %participant,
                    "late submission after battle end"
                );
                Ok(SubmitStatus::Ignored)
            }
            Ok(status) => {
                let remaining = match status {
                    SubmitStatus::Pending { remaining } => remaining,
                    _ => 0,
                };
                debug!(
                    target: "runtime::session",
                    battle = %self.battle,
                    round,
                    participant = %participant,
                    action = ?action,
                    remaining,
                    "action accepted"
                );
                self.idle_rounds = 0;
                self.event_bus.publish(Event::Round(RoundEvent::Submitted {
                    battle: self.battle,
                    round,
                    participant,
                    remaining,
                }));
                Ok(status)
            }
            Err(e) => {
                debug!(
                    target: "runtime::session",
                    battle = %self.battle,
                    round,
                    participant = %participant,
                    code = e.error_code(),
                    context = ?e.context(),
                    "submission rejected: {}",
                    e
                );
                Err(e.into())
            }
        }
    }

    /// Players that miss a round do nothing, so nobody left to submit means
    /// the battle cannot progress on its own.
    fn skips_idle_players(&self) -> bool {
        self.state.mode.timeout_policy() == TimeoutPolicy::Skip
    }

    fn on_deadline(&mut self) {
        if self.state.pending_actions.is_empty() {
            self.idle_rounds += 1;
        }

        let limit = self.state.config.idle_round_limit;
        if limit > 0 && self.idle_rounds >= limit && self.skips_idle_players() {
            info!(
                target: "runtime::session",
                battle = %self.battle,
                idle_rounds = self.idle_rounds,
                "party idle, forfeiting"
            );
            self.forfeit_party();
            return;
        }
        self.close_round(RoundClose::Timeout);
    }

    fn forfeit_party(&mut self) {
        if let Err(e) = self.handle_forfeit(SideId::PARTY) {
            warn!(target: "runtime::session", battle = %self.battle, "party forfeit refused: {}", e);
            // Keep the loop from spinning on an expired deadline.
            self.deadline = Instant::now() + self.round_timeout;
        }
    }

    fn handle_forfeit(&mut self, side: SideId) -> Result<BattleSummary> {
        let summary = BattleEngine::new(&mut self.state)
            .forfeit(side, self.context.rng.as_ref())
            .map_err(RuntimeError::from)?;
        info!(target: "runtime::session", battle = %self.battle, side = %side, "side forfeited");
        self.forfeited_by = Some(side);
        Ok(summary)
    }

    fn open_round(&mut self) {
        self.deadline = Instant::now() + self.round_timeout;
        let round = self.state.round_number;
        let expected: Vec<ParticipantId> = self.state.collecting_from.iter().copied().collect();
        debug!(
            target: "runtime::session",
            battle = %self.battle,
            round,
            expected = expected.len(),
            "round opened"
        );
        self.event_bus.publish(Event::Round(RoundEvent::Opened {
            battle: self.battle,
            round,
            expected,
            timeout_secs: self.round_timeout.as_secs(),
        }));
    }

    /// Resolves the current round exactly once, then opens the next one.
    fn close_round(&mut self, close: RoundClose) {
        let round = self.state.round_number;
        let env = BattleEnv::new(self.context.rng.as_ref())
            .with_monster_ai(self.context.monster_ai.as_ref());

        let report = match BattleEngine::new(&mut self.state).resolve_round(env, round, close) {
            Ok(report) => report,
            Err(e) => {
                warn!(
                    target: "runtime::session",
                    battle = %self.battle,
                    round,
                    code = e.error_code(),
                    context = ?e.context(),
                    "round could not be resolved: {}",
                    e
                );
                // Keep the loop from spinning on an expired deadline.
                self.deadline = Instant::now() + self.round_timeout;
                return;
            }
        };

        for event in report.clamped() {
            warn!(
                target: "runtime::session",
                battle = %self.battle,
                round,
                event = ?event,
                "repaired invariant violation"
            );
        }
        info!(
            target: "runtime::session",
            battle = %self.battle,
            round,
            close = %close,
            eliminated = report.eliminated.len(),
            battle_over = report.battle_over,
            "round resolved"
        );

        self.event_bus.publish(Event::Round(RoundEvent::Resolved {
            battle: self.battle,
            close,
            report,
        }));

        if !self.state.is_terminal() {
            self.open_round();
        }
    }

    /// Publishes the outcome, settles rewards, then releases waiting handles.
    async fn finish(mut self) {
        let Some(summary) = self.state.summary.clone() else {
            warn!(target: "runtime::session", battle = %self.battle, "battle ended without a summary");
            self.deregister();
            return;
        };
        info!(
            target: "runtime::session",
            battle = %self.battle,
            outcome = ?summary.outcome,
            rounds = summary.rounds,
            "battle finished"
        );
        self.event_bus.publish(Event::Outcome(OutcomeEvent::Finished {
            battle: self.battle,
            summary: summary.clone(),
            forfeited_by: self.forfeited_by,
            finished_at: Utc::now(),
        }));

        let settlement = settle_rewards(&self.context.store, self.battle, &summary).await;
        if !settlement.failed.is_empty() {
            warn!(
                target: "runtime::session",
                battle = %self.battle,
                failed = settlement.failed.len(),
                "some rewards were not persisted"
            );
        }

        self.deregister();
        self.finished_tx
            .send_replace(Some(Arc::new(self.state.clone())));
        self.event_bus.publish(Event::Outcome(OutcomeEvent::RewardsSettled {
            battle: self.battle,
            settled: settlement.settled,
            failed: settlement.failed,
        }));

        // Commands queued while settling are answered against the final state.
        self.command_rx.close();
        while let Ok(cmd) = self.command_rx.try_recv() {
            self.handle_command(cmd);
        }
    }

    fn deregister(&self) {
        if let Err(e) = self.context.registry.remove(self.battle) {
            warn!(target: "runtime::session", battle = %self.battle, "failed to deregister session: {}", e);
        }
    }
}
