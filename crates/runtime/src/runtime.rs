//! High-level battle orchestrator.
//!
//! The runtime seats participants, spawns one session worker per battle and
//! exposes a builder-based API for wiring in the pet store, randomness and
//! monster policy.

use std::env;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio::time::Duration;
use tracing::{debug, info, warn};

use battle_content::{ConfigLoader, MonsterCatalog};
use battle_core::{
    BattleConfig, BattleMode, BattleState, CombatStats, CombatantSpec, EnemyKind, MonsterPolicy,
    MonsterSpec, ParticipantId, PcgRng, Rarity, RngOracle, SideId, WeightedMonsterAi,
};

use crate::api::{BattleHandle, BattleId, Result, RuntimeError};
use crate::events::EventBus;
use crate::registry::SessionRegistry;
use crate::repository::{InMemoryPetStore, PetStore};
use crate::workers::{SessionContext, SessionWorker};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub battle: BattleConfig,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            battle: BattleConfig::default(),
            event_buffer_size: 100,
            command_buffer_size: 32,
        }
    }
}

impl RuntimeConfig {
    /// Defaults overridden by `BATTLE_CONFIG_PATH` (a TOML balance file) and
    /// the `BATTLE_*` tuning variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = env::var("BATTLE_CONFIG_PATH") {
            match ConfigLoader::load(Path::new(&path)) {
                Ok(battle) => config.battle = battle,
                Err(e) => {
                    warn!(target: "runtime::config", path = %path, "ignoring battle config: {:#}", e)
                }
            }
        }

        if let Some(secs) = read_env::<u64>("BATTLE_ROUND_TIMEOUT_SECS") {
            config.battle.round_timeout_secs = secs.max(1);
        }
        if let Some(limit) = read_env::<u32>("BATTLE_IDLE_ROUND_LIMIT") {
            config.battle.idle_round_limit = limit;
        }
        if let Some(capacity) = read_env::<usize>("BATTLE_EVENT_BUFFER") {
            config.event_buffer_size = capacity.max(1);
        }
        if let Some(capacity) = read_env::<usize>("BATTLE_COMMAND_BUFFER") {
            config.command_buffer_size = capacity.max(1);
        }

        config
    }

    pub fn round_timeout(&self) -> Duration {
        Duration::from_secs(self.battle.round_timeout_secs.max(1))
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

/// Orchestrates concurrent battle sessions.
///
/// Each opened battle runs in its own worker task; [`BattleHandle`] is the
/// cloneable façade clients use to talk to it.
pub struct BattleRuntime {
    config: RuntimeConfig,
    context: SessionContext,
    monsters: MonsterCatalog,
    tasks: Mutex<JoinSet<()>>,
}

impl BattleRuntime {
    /// Create a new runtime builder
    pub fn builder() -> BattleRuntimeBuilder {
        BattleRuntimeBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.context.registry
    }

    /// Handle to a live session.
    pub fn session(&self, battle: BattleId) -> Result<BattleHandle> {
        self.context
            .registry
            .get(battle)?
            .ok_or(RuntimeError::UnknownBattle { battle })
    }

    /// Open a battle between `party` and a specific monster.
    pub async fn open_pve(
        &self,
        mode: BattleMode,
        party: &[ParticipantId],
        monster: MonsterSpec,
        seed: Option<u64>,
    ) -> Result<BattleHandle> {
        let mut specs = Vec::with_capacity(party.len());
        for &id in party {
            specs.push(self.load_combatant(id).await);
        }

        let seed = seed.unwrap_or_else(rand::random);
        let state = BattleState::pve(mode, specs, &monster, self.config.battle.clone(), seed)?;
        self.spawn(state)
    }

    /// Open a battle against a monster drawn from the catalog.
    pub async fn open_encounter(
        &self,
        mode: BattleMode,
        party: &[ParticipantId],
        kind: EnemyKind,
        rarity: Rarity,
        seed: Option<u64>,
    ) -> Result<BattleHandle> {
        let seed = seed.unwrap_or_else(rand::random);
        let monster = self
            .monsters
            .select(kind, rarity, self.context.rng.as_ref(), seed);
        self.open_pve(mode, party, monster, Some(seed)).await
    }

    /// Open a player-versus-player battle.
    ///
    /// Sides are ignored in free-for-all, where every entrant fights alone.
    pub async fn open_pvp(
        &self,
        mode: BattleMode,
        entrants: &[(ParticipantId, SideId)],
        seed: Option<u64>,
    ) -> Result<BattleHandle> {
        let mut specs = Vec::with_capacity(entrants.len());
        for &(id, side) in entrants {
            specs.push(self.load_combatant(id).await.on_side(side));
        }

        let seed = seed.unwrap_or_else(rand::random);
        let state = BattleState::pvp(mode, specs, self.config.battle.clone(), seed)?;
        self.spawn(state)
    }

    async fn load_combatant(&self, id: ParticipantId) -> CombatantSpec {
        match self.context.store.load(id).await {
            Ok(record) => record.to_combatant(id),
            Err(e) => {
                let fallback = &self.config.battle.fallback;
                warn!(
                    target: "runtime::store",
                    participant = %id,
                    "pet data unavailable, using fallback stats: {}",
                    e
                );
                CombatantSpec::new(
                    id,
                    format!("Pet {}", id),
                    CombatStats::new(fallback.attack, fallback.defense),
                    fallback.max_hp,
                )
            }
        }
    }

    fn spawn(&self, state: BattleState) -> Result<BattleHandle> {
        let battle = self.context.registry.allocate();
        let (command_tx, command_rx) = mpsc::channel(self.config.command_buffer_size);
        let (finished_tx, finished_rx) = watch::channel(None);
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);

        let handle = BattleHandle::new(battle, command_tx, event_bus.clone(), finished_rx);
        let worker = SessionWorker::new(
            battle,
            state,
            command_rx,
            event_bus,
            self.context.clone(),
            finished_tx,
            self.config.round_timeout(),
        );

        self.context.registry.insert(handle.clone())?;

        let mut tasks = self.tasks.lock().map_err(|_| RuntimeError::LockPoisoned)?;
        while let Some(joined) = tasks.try_join_next() {
            if let Err(e) = joined {
                warn!(target: "runtime::session", "session task failed: {}", e);
            }
        }
        tasks.spawn(worker.run());

        info!(target: "runtime::session", battle = %battle, "session opened");
        Ok(handle)
    }

    /// Abort every live session and wait for the workers to exit.
    ///
    /// Aborted battles settle no rewards.
    pub async fn shutdown(self) -> Result<()> {
        for battle in self.context.registry.active_ids()? {
            let Some(handle) = self.context.registry.get(battle)? else {
                continue;
            };
            if let Err(e) = handle.abort().await {
                debug!(target: "runtime::session", battle = %battle, "abort not delivered: {}", e);
            }
        }

        let mut tasks = self
            .tasks
            .into_inner()
            .map_err(|_| RuntimeError::LockPoisoned)?;
        while let Some(joined) = tasks.join_next().await {
            joined.map_err(RuntimeError::WorkerJoin)?;
        }

        Ok(())
    }
}

/// Builder for [`BattleRuntime`] with flexible configuration.
pub struct BattleRuntimeBuilder {
    config: RuntimeConfig,
    store: Option<Arc<dyn PetStore>>,
    rng: Option<Arc<dyn RngOracle>>,
    monster_ai: Option<Arc<dyn MonsterPolicy>>,
    monsters: MonsterCatalog,
}

impl BattleRuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            store: None,
            rng: None,
            monster_ai: None,
            monsters: MonsterCatalog::default(),
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Shares a pet store with the runtime; callers may keep their own `Arc`.
    pub fn pet_store<S: PetStore + 'static>(mut self, store: Arc<S>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn rng(mut self, rng: impl RngOracle + 'static) -> Self {
        self.rng = Some(Arc::new(rng));
        self
    }

    pub fn monster_ai(mut self, monster_ai: impl MonsterPolicy + 'static) -> Self {
        self.monster_ai = Some(Arc::new(monster_ai));
        self
    }

    pub fn monsters(mut self, monsters: MonsterCatalog) -> Self {
        self.monsters = monsters;
        self
    }

    pub fn build(self) -> BattleRuntime {
        let context = SessionContext {
            store: self
                .store
                .unwrap_or_else(|| Arc::new(InMemoryPetStore::new())),
            rng: self.rng.unwrap_or_else(|| Arc::new(PcgRng)),
            monster_ai: self
                .monster_ai
                .unwrap_or_else(|| Arc::new(WeightedMonsterAi)),
            registry: SessionRegistry::new(),
        };

        BattleRuntime {
            config: self.config,
            context,
            monsters: self.monsters,
            tasks: Mutex::new(JoinSet::new()),
        }
    }
}

impl Default for BattleRuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
