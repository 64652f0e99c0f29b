//! Agent settings edited by the user.

use serde::{Deserialize, Serialize};

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// System instruction used when none is configured.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are an assistant embedded in a web page. \
Use the tools the page provides to answer the user's requests.";

/// User-editable agent settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AgentSettings {
    /// Model provider API key. Chat is refused while unset.
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: String,
    /// Instruction prepended to every chat session.
    pub system_instruction: String,
    /// Upper bound on function-calling rounds for one user message.
    pub max_function_rounds: u32,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_owned(),
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_owned(),
            max_function_rounds: 8,
        }
    }
}

impl AgentSettings {
    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Returns the API key when it is set and not blank.
    #[must_use]
    pub fn usable_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}
