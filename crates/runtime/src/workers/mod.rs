//! Worker tasks that back the runtime orchestration.
//!
//! One session worker runs per battle; reward settlement runs inside it once
//! the battle terminates.

mod rewards;
mod session;

pub(crate) use session::{Command, SessionContext, SessionWorker};
