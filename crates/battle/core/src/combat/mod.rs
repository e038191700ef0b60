//! Combat arithmetic: attack rolls, single attacks and monster group attacks.
//!
//! Everything here is a pure function of its inputs. Random draws are made by
//! the caller and passed in, which keeps the formulas directly testable.

mod damage;
mod group;
mod roll;

pub use damage::{AttackInput, AttackResolution, effective_defense, resolve_attack};
pub use group::{GroupHit, GroupTarget, resolve_group_attack};
pub use roll::attack_roll_multiplier;
