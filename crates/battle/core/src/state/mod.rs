//! Battle data model.
//!
//! [`BattleState`] is plain data: every field that influences resolution is
//! public and serialisable, so a snapshot taken mid-battle resolves exactly like
//! the live value.
mod battle;
mod mode;
mod monster;
mod participant;

pub use battle::{BattlePhase, BattleState, Encounter, SetupError};
pub use mode::{BattleMode, ChargePolicy, TimeoutPolicy, UndefendedBaseline, VictoryRule};
pub use monster::{EnemyKind, MonsterSpec, Rarity};
pub use participant::{
    CombatLedger, CombatStats, CombatantSpec, Controller, Participant, ParticipantId, SideId,
};
