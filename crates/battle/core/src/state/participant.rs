use std::collections::BTreeSet;

/// Opaque participant identifier (player account id or reserved NPC id).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParticipantId(pub u64);

impl ParticipantId {
    /// Reserved id of the monster in PvE encounters.
    pub const MONSTER: Self = Self(u64::MAX);

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if *self == Self::MONSTER {
            write!(f, "monster")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Side (team) a participant fights for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SideId(pub u32);

impl SideId {
    /// The party in PvE encounters.
    pub const PARTY: Self = Self(0);
    /// The monster's side in PvE encounters.
    pub const ENEMY: Self = Self(1);
}

impl core::fmt::Display for SideId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "side-{}", self.0)
    }
}

/// Who decides a participant's actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Controller {
    /// Submits actions through the collection protocol.
    Player,
    /// Acts through the monster policy during resolution.
    Npc,
}

/// Attack and defense supplied by the external pet and equipment systems.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatStats {
    pub base_attack: u32,
    pub base_defense: u32,
    pub equipment_attack_bonus: u32,
    pub equipment_defense_bonus: u32,
}

impl CombatStats {
    /// Stats with no equipment bonus.
    pub const fn new(attack: u32, defense: u32) -> Self {
        Self {
            base_attack: attack,
            base_defense: defense,
            equipment_attack_bonus: 0,
            equipment_defense_bonus: 0,
        }
    }

    #[must_use]
    pub const fn with_equipment(mut self, attack_bonus: u32, defense_bonus: u32) -> Self {
        self.equipment_attack_bonus = attack_bonus;
        self.equipment_defense_bonus = defense_bonus;
        self
    }

    pub const fn effective_attack(&self) -> u32 {
        self.base_attack.saturating_add(self.equipment_attack_bonus)
    }

    pub const fn effective_defense(&self) -> u32 {
        self.base_defense.saturating_add(self.equipment_defense_bonus)
    }
}

/// End-of-battle accounting. Never read by the damage rules.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatLedger {
    pub damage_dealt: u64,
    pub damage_taken: u64,
    pub kills: u32,
    pub assists: u32,
    pub xp_earned: u64,
    /// Everyone who has damaged this participant, for assist credit.
    pub damaged_by: BTreeSet<ParticipantId>,
    pub killed_by: Option<ParticipantId>,
}

/// Initialisation input for one combatant.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantSpec {
    pub id: ParticipantId,
    pub name: String,
    /// Ignored in PvE (the party is one side) and free-for-all (everyone is alone).
    pub side: SideId,
    pub stats: CombatStats,
    pub max_hp: u32,
    /// Defaults to `max_hp` when absent.
    pub current_hp: Option<u32>,
}

impl CombatantSpec {
    pub fn new(id: ParticipantId, name: impl Into<String>, stats: CombatStats, max_hp: u32) -> Self {
        Self {
            id,
            name: name.into(),
            side: SideId::PARTY,
            stats,
            max_hp,
            current_hp: None,
        }
    }

    #[must_use]
    pub fn on_side(mut self, side: SideId) -> Self {
        self.side = side;
        self
    }

    #[must_use]
    pub fn wounded(mut self, current_hp: u32) -> Self {
        self.current_hp = Some(current_hp);
        self
    }
}

/// One combatant inside a battle.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub side: SideId,
    pub controller: Controller,
    pub stats: CombatStats,
    pub hp: u32,
    pub max_hp: u32,
    /// Multiplier for the next attack. Always at least 1.0.
    pub charge_multiplier: f64,
    /// Set only during the round in which Charge was chosen.
    pub charging: bool,
    pub alive: bool,
    /// Who this participant is defending this round (may be itself).
    pub guard_target: Option<ParticipantId>,
    pub ledger: CombatLedger,
}

impl Participant {
    pub(crate) fn from_spec(spec: CombatantSpec, side: SideId, controller: Controller) -> Self {
        let hp = spec.current_hp.unwrap_or(spec.max_hp).min(spec.max_hp);
        Self {
            id: spec.id,
            name: spec.name,
            side,
            controller,
            stats: spec.stats,
            hp,
            max_hp: spec.max_hp,
            charge_multiplier: 1.0,
            charging: false,
            alive: hp > 0,
            guard_target: None,
            ledger: CombatLedger::default(),
        }
    }

    pub fn attack(&self) -> u32 {
        self.stats.effective_attack()
    }

    pub fn defense(&self) -> u32 {
        self.stats.effective_defense()
    }

    /// Remaining HP as a fraction of max HP.
    pub fn health_fraction(&self) -> f64 {
        if self.max_hp == 0 {
            return 0.0;
        }
        f64::from(self.hp) / f64::from(self.max_hp)
    }

    /// Remaining HP in whole percent, rounded down.
    pub fn health_percent(&self) -> u32 {
        if self.max_hp == 0 {
            return 0;
        }
        ((u64::from(self.hp) * 100) / u64::from(self.max_hp)) as u32
    }

    pub fn is_player(&self) -> bool {
        self.controller == Controller::Player
    }

    /// Removes `amount` HP, clamping at zero. Returns true if this killed the participant.
    pub(crate) fn take_damage(&mut self, amount: u32, source: ParticipantId) -> bool {
        if amount == 0 || !self.alive {
            return false;
        }
        self.hp = self.hp.saturating_sub(amount);
        self.ledger.damage_taken += u64::from(amount);
        if source != self.id {
            self.ledger.damaged_by.insert(source);
        }
        if self.hp == 0 {
            self.alive = false;
            self.ledger.killed_by = Some(source);
            return true;
        }
        false
    }
}
