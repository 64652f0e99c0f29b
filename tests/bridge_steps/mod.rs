//! Step definitions for capability bridge scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
