//! Port contracts for the agent UI controller.

mod model;

#[cfg(test)]
pub use model::MockModelClient;
pub use model::{ModelClient, ModelClientError, ModelClientResult};
