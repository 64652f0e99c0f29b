//! Port contracts for page-side handlers and the registration surface.

mod handler;
mod model_context;

pub use handler::{HandlerError, HandlerResult, PromptHandler, ResourceHandler, ToolHandler};
pub use model_context::ModelContext;
