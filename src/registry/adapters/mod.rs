//! Adapter implementations for registry ports.

mod closure;
mod recording;

pub use closure::{prompt_fn, resource_fn, tool_fn};
pub use recording::RecordingModelContext;
