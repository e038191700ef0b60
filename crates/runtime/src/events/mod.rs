//! Topic-based event bus for battle events.
//!
//! Each session publishes to its own bus; consumers subscribe only to the
//! topics they need.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{OutcomeEvent, RoundEvent};
