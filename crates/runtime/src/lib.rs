//! Async orchestration for battles.
//!
//! Each battle runs in its own [`workers`] task that owns the authoritative
//! [`battle_core::BattleState`]. Consumers open battles through [`BattleRuntime`]
//! and interact with them through cloneable [`BattleHandle`]s.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator, builder and configuration
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides the topic-based event bus
//! - [`registry`] tracks live sessions by battle id
//! - [`repository`] provides the pet store port and its adapters
pub mod api;
pub mod events;
pub mod registry;
pub mod repository;
pub mod runtime;

mod workers;

pub use api::{BattleHandle, BattleId, Result, RuntimeError};
pub use events::{Event, EventBus, OutcomeEvent, RoundEvent, Topic};
pub use registry::SessionRegistry;
pub use repository::{FilePetStore, InMemoryPetStore, PetRecord, PetStore, RepositoryError};
pub use runtime::{BattleRuntime, BattleRuntimeBuilder, RuntimeConfig};
