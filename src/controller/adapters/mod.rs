//! Adapter implementations for controller ports.

mod scripted;

pub use scripted::ScriptedModelClient;
