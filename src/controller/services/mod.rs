//! Service layer for the agent UI.

mod controller;

pub use controller::{AgentController, ControllerError, ControllerResult};
