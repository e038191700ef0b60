/// Battle mode. Selects the policies that differ between PvE and PvP.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BattleMode {
    /// One player against one monster.
    SoloPve,
    /// A party against one monster.
    GroupPve,
    /// Named teams; the last team standing wins.
    PvpTeam,
    /// Everyone for themselves; the last participant standing wins.
    PvpFreeForAll,
    /// Bracket match between two sides.
    Tournament,
}

/// How the Charge action escalates the multiplier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChargePolicy {
    /// `min(cap, charge * 2)`.
    Doubling,
    /// Next step on the discrete progression.
    Progression,
}

/// Defense applied to an attack on a target nobody is guarding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UndefendedBaseline {
    /// Raw defense halved: always-on chip mitigation.
    HalvedDefense,
    /// No mitigation at all.
    ZeroDefense,
}

/// What happens to participants that did not submit before the round timed out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeoutPolicy {
    /// They forfeit this round's action.
    Skip,
    /// They attack a random alive enemy.
    RandomAttack,
}

/// Termination rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VictoryRule {
    /// Monster at zero HP, or the whole party down.
    MonsterOrParty,
    /// One side with alive members left.
    LastSide,
    /// At most one participant alive.
    LastStanding,
}

impl BattleMode {
    pub const fn is_pve(self) -> bool {
        matches!(self, Self::SoloPve | Self::GroupPve)
    }

    pub const fn charge_policy(self) -> ChargePolicy {
        if self.is_pve() {
            ChargePolicy::Doubling
        } else {
            ChargePolicy::Progression
        }
    }

    pub const fn undefended_baseline(self) -> UndefendedBaseline {
        if self.is_pve() {
            UndefendedBaseline::HalvedDefense
        } else {
            UndefendedBaseline::ZeroDefense
        }
    }

    pub const fn timeout_policy(self) -> TimeoutPolicy {
        if self.is_pve() {
            TimeoutPolicy::Skip
        } else {
            TimeoutPolicy::RandomAttack
        }
    }

    pub const fn victory_rule(self) -> VictoryRule {
        match self {
            Self::SoloPve | Self::GroupPve => VictoryRule::MonsterOrParty,
            Self::PvpTeam | Self::Tournament => VictoryRule::LastSide,
            Self::PvpFreeForAll => VictoryRule::LastStanding,
        }
    }

    /// Whether a pair attacking each other resolves as a simultaneous clash.
    pub const fn resolves_mutual_attacks(self) -> bool {
        !self.is_pve()
    }

    /// Attacks on a target that already fell this round pick a new enemy.
    pub const fn retargets_fallen(self) -> bool {
        !self.is_pve()
    }

    /// Whether the winner earns the larger solo bonus instead of the team bonus.
    pub const fn earns_solo_win_bonus(self) -> bool {
        matches!(self, Self::PvpFreeForAll | Self::Tournament)
    }
}
