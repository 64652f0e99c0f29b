//! Service layer for directory routing and call forwarding.

mod router;

pub use router::{Router, RouterError, RouterResult};
