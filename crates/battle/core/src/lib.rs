//! Deterministic combat rules shared by every battle mode.
//!
//! `battle-core` defines the canonical battle data model, the per-round action
//! collection state machine and the damage arithmetic. It performs no I/O:
//! randomness is injected through [`env::RngOracle`] and every state change flows
//! through [`engine::BattleEngine`], so the async runtime and offline tools can
//! reuse the same rules.
pub mod action;
pub mod ai;
pub mod combat;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod outcome;
pub mod state;

pub use action::{Action, ActionKind, InvalidTarget, SubmitError, SubmitStatus};
pub use ai::{AlwaysAttack, MonsterPolicy, WeightedMonsterAi};
pub use combat::{
    AttackInput, AttackResolution, GroupHit, GroupTarget, attack_roll_multiplier, resolve_attack,
    resolve_group_attack,
};
pub use config::{BattleConfig, ChargeParams, DamageParams, FallbackStats, RewardParams};
pub use engine::{
    BattleEngine, ClampedField, CombatEvent, ForfeitError, HpChange, ResolveError, RoundClose,
    RoundReport,
};
pub use env::{BattleEnv, FixedRng, PcgRng, RngOracle, RollContext, compute_seed};
pub use error::{CombatError, ErrorContext, ErrorSeverity};
pub use outcome::{
    BattleOutcome, BattleSummary, LootAward, Outcome, ParticipantReward, evaluate_victory,
    forfeit_outcome, summarize,
};
pub use state::{
    BattleMode, BattlePhase, BattleState, ChargePolicy, CombatLedger, CombatStats, CombatantSpec,
    Controller, EnemyKind, Encounter, MonsterSpec, Participant, ParticipantId, Rarity, SetupError,
    SideId, TimeoutPolicy, UndefendedBaseline, VictoryRule,
};
