//! Storage adapters
//!
//! - [`MemoryStore`] - in-process transactional store and group directory

mod memory;

pub use memory::{MemoryStore, StoredElectionResult, StoredHolder};
