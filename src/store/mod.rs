//! Persistence layer — the `Store` trait and its backends.

mod memory;
mod rest;
mod traits;

pub use memory::{MemoryStore, StoredFarm};
pub use rest::RestStore;
pub use traits::Store;
