//! Pet store port and its adapters.
//!
//! Pets live outside the battle engine: a session loads each participant's
//! stats when it opens and writes rewards back when it terminates.

mod error;
mod file;
mod memory;
mod traits;
mod types;

pub use error::{RepositoryError, Result};
pub use file::FilePetStore;
pub use memory::InMemoryPetStore;
pub use traits::PetStore;
pub use types::PetRecord;
