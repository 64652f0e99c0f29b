//! Adapter implementations for router ports.

mod file;
mod hub;
mod memory;

pub use file::JsonFileDirectoryStore;
pub use hub::{ControllerSlot, RelayHub};
pub use memory::InMemoryDirectoryStore;
