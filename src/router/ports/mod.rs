//! Port contracts for persistence and cross-context links.

mod link;
mod store;

pub use link::{ControllerLink, LinkError, LinkResult, RelayLink, RouterLink};
pub use store::{DirectoryStore, DirectoryStoreError, DirectoryStoreResult};
