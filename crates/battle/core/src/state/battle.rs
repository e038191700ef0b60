use std::collections::{BTreeMap, BTreeSet};

use crate::action::Action;
use crate::config::BattleConfig;
use crate::error::{CombatError, ErrorSeverity};
use crate::outcome::{BattleOutcome, BattleSummary};

use super::{
    BattleMode, CombatantSpec, Controller, EnemyKind, MonsterSpec, Participant, ParticipantId,
    Rarity, SideId,
};

/// Round protocol phase.
///
/// `Setup -> Collecting -> Resolving -> (Collecting | Terminated)`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum BattlePhase {
    /// Participants seated, first round not opened yet.
    #[default]
    Setup,
    /// Accepting one action per expected participant.
    Collecting,
    /// Quorum reached; no submissions accepted until the round resolves.
    Resolving,
    /// Battle over. The state is inert.
    Terminated,
}

/// PvE encounter metadata used for rewards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Encounter {
    pub monster: ParticipantId,
    pub rarity: Rarity,
    pub kind: EnemyKind,
}

/// Errors raised while seating a battle.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error("mode {mode} cannot be built with this constructor")]
    WrongMode { mode: BattleMode },

    #[error("battle needs at least one player")]
    NoPlayers,

    #[error("solo battles take exactly one player, got {count}")]
    SoloPartySize { count: usize },

    #[error("participant id {id} is reserved")]
    ReservedId { id: ParticipantId },

    #[error("participant {id} entered twice")]
    DuplicateParticipant { id: ParticipantId },

    #[error("participant {id} has no max HP")]
    InvalidMaxHp { id: ParticipantId },

    #[error("participant {id} enters with no HP left")]
    AlreadyDefeated { id: ParticipantId },

    #[error("battle needs at least two sides, got {count}")]
    NotEnoughSides { count: usize },
}

impl CombatError for SetupError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::WrongMode { .. } => "SETUP_WRONG_MODE",
            Self::NoPlayers => "SETUP_NO_PLAYERS",
            Self::SoloPartySize { .. } => "SETUP_SOLO_PARTY_SIZE",
            Self::ReservedId { .. } => "SETUP_RESERVED_ID",
            Self::DuplicateParticipant { .. } => "SETUP_DUPLICATE_PARTICIPANT",
            Self::InvalidMaxHp { .. } => "SETUP_INVALID_MAX_HP",
            Self::AlreadyDefeated { .. } => "SETUP_ALREADY_DEFEATED",
            Self::NotEnoughSides { .. } => "SETUP_NOT_ENOUGH_SIDES",
        }
    }
}

/// Complete state of one battle.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleState {
    pub mode: BattleMode,
    pub config: BattleConfig,
    /// Base seed for every roll in this battle.
    pub seed: u64,
    pub participants: BTreeMap<ParticipantId, Participant>,
    pub encounter: Option<Encounter>,
    /// Starts at 0 and is incremented when each round opens.
    pub round_number: u32,
    pub phase: BattlePhase,
    /// Alive players snapshotted when the current round opened.
    pub collecting_from: BTreeSet<ParticipantId>,
    pub pending_actions: BTreeMap<ParticipantId, Action>,
    pub battle_over: bool,
    pub outcome: Option<BattleOutcome>,
    pub summary: Option<BattleSummary>,
}

impl BattleState {
    /// Seats a party against one monster.
    pub fn pve(
        mode: BattleMode,
        party: Vec<CombatantSpec>,
        monster: &MonsterSpec,
        config: BattleConfig,
        seed: u64,
    ) -> Result<Self, SetupError> {
        if !mode.is_pve() {
            return Err(SetupError::WrongMode { mode });
        }
        if party.is_empty() {
            return Err(SetupError::NoPlayers);
        }
        if mode == BattleMode::SoloPve && party.len() != 1 {
            return Err(SetupError::SoloPartySize { count: party.len() });
        }

        let mut state = Self::empty(mode, config, seed);
        for spec in party {
            state.seat(spec, SideId::PARTY, Controller::Player)?;
        }

        let npc = monster.to_combatant();
        if npc.max_hp == 0 {
            return Err(SetupError::InvalidMaxHp { id: npc.id });
        }
        state.participants.insert(
            npc.id,
            Participant::from_spec(npc, SideId::ENEMY, Controller::Npc),
        );
        state.encounter = Some(Encounter {
            monster: ParticipantId::MONSTER,
            rarity: monster.rarity,
            kind: monster.kind,
        });

        Ok(state)
    }

    /// Seats player-versus-player entrants.
    ///
    /// Free-for-all gives every entrant its own side; team modes keep the
    /// sides supplied by the caller.
    pub fn pvp(
        mode: BattleMode,
        entrants: Vec<CombatantSpec>,
        config: BattleConfig,
        seed: u64,
    ) -> Result<Self, SetupError> {
        if mode.is_pve() {
            return Err(SetupError::WrongMode { mode });
        }
        if entrants.is_empty() {
            return Err(SetupError::NoPlayers);
        }

        let mut state = Self::empty(mode, config, seed);
        for (index, spec) in entrants.into_iter().enumerate() {
            let side = if mode == BattleMode::PvpFreeForAll {
                SideId(index as u32)
            } else {
                spec.side
            };
            state.seat(spec, side, Controller::Player)?;
        }

        let sides = state.alive_sides().len();
        if sides < 2 {
            return Err(SetupError::NotEnoughSides { count: sides });
        }
        Ok(state)
    }

    fn empty(mode: BattleMode, config: BattleConfig, seed: u64) -> Self {
        Self {
            mode,
            config,
            seed,
            participants: BTreeMap::new(),
            encounter: None,
            round_number: 0,
            phase: BattlePhase::Setup,
            collecting_from: BTreeSet::new(),
            pending_actions: BTreeMap::new(),
            battle_over: false,
            outcome: None,
            summary: None,
        }
    }

    fn seat(&mut self, spec: CombatantSpec, side: SideId, controller: Controller) -> Result<(), SetupError> {
        let id = spec.id;
        if id == ParticipantId::MONSTER {
            return Err(SetupError::ReservedId { id });
        }
        if self.participants.contains_key(&id) {
            return Err(SetupError::DuplicateParticipant { id });
        }
        if spec.max_hp == 0 {
            return Err(SetupError::InvalidMaxHp { id });
        }
        if spec.current_hp == Some(0) {
            return Err(SetupError::AlreadyDefeated { id });
        }
        self.participants
            .insert(id, Participant::from_spec(spec, side, controller));
        Ok(())
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.get(&id)
    }

    pub fn participant_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        self.participants.get_mut(&id)
    }

    /// The monster in PvE encounters.
    pub fn monster(&self) -> Option<&Participant> {
        self.encounter
            .and_then(|encounter| self.participants.get(&encounter.monster))
    }

    pub fn is_alive(&self, id: ParticipantId) -> bool {
        self.participants.get(&id).is_some_and(|p| p.alive)
    }

    /// Alive participants that submit actions through the protocol.
    pub fn alive_players(&self) -> impl Iterator<Item = &Participant> {
        self.participants
            .values()
            .filter(|p| p.alive && p.is_player())
    }

    /// True when both exist and fight for different sides.
    pub fn are_enemies(&self, a: ParticipantId, b: ParticipantId) -> bool {
        match (self.participants.get(&a), self.participants.get(&b)) {
            (Some(a), Some(b)) => a.side != b.side,
            _ => false,
        }
    }

    /// True when both exist and fight for the same side (including `a == b`).
    pub fn are_allies(&self, a: ParticipantId, b: ParticipantId) -> bool {
        match (self.participants.get(&a), self.participants.get(&b)) {
            (Some(a), Some(b)) => a.side == b.side,
            _ => false,
        }
    }

    /// Alive enemies of `id`, in id order.
    pub fn alive_enemies_of(&self, id: ParticipantId) -> Vec<ParticipantId> {
        let Some(side) = self.participants.get(&id).map(|p| p.side) else {
            return Vec::new();
        };
        self.participants
            .values()
            .filter(|p| p.alive && p.side != side)
            .map(|p| p.id)
            .collect()
    }

    /// Sides that still have at least one alive member.
    pub fn alive_sides(&self) -> BTreeSet<SideId> {
        self.participants
            .values()
            .filter(|p| p.alive)
            .map(|p| p.side)
            .collect()
    }

    /// All sides that entered the battle.
    pub fn sides(&self) -> BTreeSet<SideId> {
        self.participants.values().map(|p| p.side).collect()
    }

    pub fn is_terminal(&self) -> bool {
        self.battle_over || self.phase == BattlePhase::Terminated
    }

    /// Encodes the state with bincode.
    #[cfg(feature = "serde")]
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Decodes a state produced by [`BattleState::to_bytes`].
    #[cfg(feature = "serde")]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}
