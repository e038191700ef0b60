//! Structured round output.
//!
//! Narrative text is a consumer of these events; nothing here is formatted
//! for display.

use std::collections::BTreeMap;

use crate::action::{Action, ActionKind};
use crate::combat::{AttackResolution, GroupHit};
use crate::outcome::BattleOutcome;
use crate::state::{ParticipantId, SideId};

/// HP before and after one round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HpChange {
    pub before: u32,
    pub after: u32,
}

impl HpChange {
    pub fn delta(&self) -> i64 {
        i64::from(self.after) - i64::from(self.before)
    }
}

/// Field repaired by the post-round invariant check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ClampedField {
    Hp,
    ChargeMultiplier,
}

/// One thing that happened during resolution, in resolution order.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CombatEvent {
    /// The round closed on timeout without an action from this participant.
    TimedOut {
        participant: ParticipantId,
        fallback: Option<Action>,
    },
    Charged {
        participant: ParticipantId,
        multiplier: f64,
    },
    Guarding {
        defender: ParticipantId,
        target: ParticipantId,
    },
    Attack {
        attacker: ParticipantId,
        target: ParticipantId,
        roll: u32,
        guarded_by: Option<ParticipantId>,
        resolution: AttackResolution,
    },
    /// The chosen target fell earlier this round.
    Retargeted {
        attacker: ParticipantId,
        from: ParticipantId,
        to: ParticipantId,
    },
    /// The attack found no valid target.
    Fizzled {
        attacker: ParticipantId,
        target: ParticipantId,
    },
    /// Two participants attacked each other and struck simultaneously.
    MutualClash {
        first: ParticipantId,
        second: ParticipantId,
        first_roll: u32,
        second_roll: u32,
        first_hit: AttackResolution,
        second_hit: AttackResolution,
    },
    MonsterAction {
        monster: ParticipantId,
        action: ActionKind,
    },
    GroupAttack {
        monster: ParticipantId,
        roll: u32,
        hits: BTreeMap<ParticipantId, GroupHit>,
    },
    Eliminated {
        participant: ParticipantId,
        by: ParticipantId,
    },
    InvariantClamped {
        participant: ParticipantId,
        field: ClampedField,
    },
    Forfeited {
        side: SideId,
    },
}

/// Result of one resolved round.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundReport {
    pub round: u32,
    pub events: Vec<CombatEvent>,
    /// Participants whose HP changed this round.
    pub hp_changes: BTreeMap<ParticipantId, HpChange>,
    /// Participants eliminated this round, in elimination order.
    pub eliminated: Vec<ParticipantId>,
    pub battle_over: bool,
    pub outcome: Option<BattleOutcome>,
}

impl RoundReport {
    /// Events that record a repaired invariant.
    pub fn clamped(&self) -> impl Iterator<Item = &CombatEvent> {
        self.events
            .iter()
            .filter(|event| matches!(event, CombatEvent::InvariantClamped { .. }))
    }
}
