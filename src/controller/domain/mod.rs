//! Domain types for the agent UI controller.

mod model;
mod session;
mod settings;
mod status;
mod transcript;

pub use model::{FunctionCall, FunctionDeclaration, ModelInput, ModelRequest, ModelTurn};
pub use session::{ChatSession, PageSnapshot};
pub use settings::{AgentSettings, DEFAULT_MODEL, DEFAULT_SYSTEM_INSTRUCTION};
pub use status::ControllerStatus;
pub use transcript::{Transcript, TranscriptEntry, TranscriptRole};
