//! Built-in monster table used when the catalog has no matching entry.

use battle_core::{EnemyKind, MonsterSpec, Rarity};

/// Base stats for a fallback monster of one rarity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FallbackMonster {
    pub health: u32,
    pub attack: u32,
    pub defense: u32,
}

impl FallbackMonster {
    pub const fn for_rarity(rarity: Rarity) -> Self {
        let (health, attack, defense) = match rarity {
            Rarity::Common => (100, 8, 5),
            Rarity::Uncommon => (150, 12, 8),
            Rarity::Rare => (200, 16, 10),
            Rarity::Epic => (300, 22, 15),
            Rarity::Legendary => (400, 28, 20),
            Rarity::Mythic => (500, 35, 25),
        };
        Self {
            health,
            attack,
            defense,
        }
    }
}

/// Builds the fallback monster for `kind` and `rarity`, named "`<Rarity> <Kind>`".
///
/// Stats depend on rarity only; the kind still scales rewards.
pub fn fallback_monster(kind: EnemyKind, rarity: Rarity) -> MonsterSpec {
    let stats = FallbackMonster::for_rarity(rarity);
    MonsterSpec {
        name: format!("{} {}", title_case(rarity.as_ref()), title_case(kind.as_ref())),
        health: stats.health,
        attack: stats.attack,
        defense: stats.defense,
        rarity,
        kind,
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
