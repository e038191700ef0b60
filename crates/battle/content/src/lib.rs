//! Data-driven battle content.
//!
//! - Balance configuration (TOML)
//! - Monster catalog (RON), with a built-in fallback table by rarity
//!
//! Content is consumed when a battle is seated and never appears in battle state
//! beyond the [`battle_core::MonsterSpec`] it produces.

pub mod fallback;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use fallback::{FallbackMonster, fallback_monster};

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, ContentFactory, LoadResult, MonsterCatalog, MonsterEntry, MonsterLoader};
