//! Page snapshot and chat session state.

use super::{AgentSettings, FunctionDeclaration, ModelInput, ModelRequest};
use crate::capability::domain::{PromptDescriptor, ResourceDescriptor, ToolDescriptor};

/// Capabilities of the active page as last reported by the router.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSnapshot {
    /// Tools offered by the page.
    pub tools: Vec<ToolDescriptor>,
    /// Resources offered by the page.
    pub resources: Vec<ResourceDescriptor>,
    /// Prompts offered by the page.
    pub prompts: Vec<PromptDescriptor>,
}

/// A model conversation bound to one tool set.
///
/// Sessions are discarded whenever the tool set or the settings change; the
/// next user message starts a fresh one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSession {
    model: String,
    system_instruction: String,
    tools: Vec<FunctionDeclaration>,
    history: Vec<ModelInput>,
}

impl ChatSession {
    /// Starts a session declaring `tools` to the model.
    #[must_use]
    pub fn start(settings: &AgentSettings, tools: &[ToolDescriptor]) -> Self {
        Self {
            model: settings.model.clone(),
            system_instruction: settings.system_instruction.clone(),
            tools: tools.iter().map(FunctionDeclaration::from).collect(),
            history: Vec::new(),
        }
    }

    /// Appends to the conversation.
    pub fn push(&mut self, input: ModelInput) {
        self.history.push(input);
    }

    /// Returns the conversation so far.
    #[must_use]
    pub fn history(&self) -> &[ModelInput] {
        &self.history
    }

    /// Returns the functions declared to the model.
    #[must_use]
    pub fn tools(&self) -> &[FunctionDeclaration] {
        &self.tools
    }

    /// Builds the next request from the whole conversation.
    #[must_use]
    pub fn request(&self) -> ModelRequest {
        let system_instruction = Some(self.system_instruction.clone())
            .filter(|instruction| !instruction.trim().is_empty());
        ModelRequest {
            model: self.model.clone(),
            system_instruction,
            tools: self.tools.clone(),
            contents: self.history.clone(),
            max_tokens: None,
        }
    }
}
