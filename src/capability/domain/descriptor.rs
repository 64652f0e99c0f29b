//! Handler-free capability descriptors.
//!
//! Descriptors are what the page announces outward. They carry the declared
//! metadata of a capability and never its handler.

use super::{CapabilityDomainError, ParseCapabilityKindError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

const DEFAULT_RESOURCE_MIME_TYPE: &str = "text/plain";

/// The three kinds of capability a page can advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    /// Invocable tool.
    Tool,
    /// Readable resource.
    Resource,
    /// Parameterised prompt template.
    Prompt,
}

impl CapabilityKind {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tool => "tool",
            Self::Resource => "resource",
            Self::Prompt => "prompt",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for CapabilityKind {
    type Error = ParseCapabilityKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tool" => Ok(Self::Tool),
            "resource" => Ok(Self::Resource),
            "prompt" => Ok(Self::Prompt),
            _ => Err(ParseCapabilityKindError(value.to_owned())),
        }
    }
}

fn normalize_name(
    kind: CapabilityKind,
    name: impl Into<String>,
) -> Result<String, CapabilityDomainError> {
    let normalized = name.into().trim().to_owned();
    if normalized.is_empty() {
        return Err(CapabilityDomainError::EmptyCapabilityName(kind));
    }
    Ok(normalized)
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn default_mime_type() -> String {
    DEFAULT_RESOURCE_MIME_TYPE.to_owned()
}

/// Advertised metadata of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "empty_object")]
    input_schema: Value,
}

impl ToolDescriptor {
    /// Creates a tool descriptor with an empty input shape.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityDomainError::EmptyCapabilityName`] when the name
    /// is empty after trimming.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, CapabilityDomainError> {
        Ok(Self {
            name: normalize_name(CapabilityKind::Tool, name)?,
            description: description.into(),
            input_schema: empty_object(),
        })
    }

    /// Sets the declared input shape.
    #[must_use]
    pub fn with_input_schema(mut self, input_schema: Value) -> Self {
        self.input_schema = input_schema;
        self
    }

    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the tool description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the declared input shape.
    #[must_use]
    pub const fn input_schema(&self) -> &Value {
        &self.input_schema
    }
}

/// Advertised metadata of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_mime_type")]
    mime_type: String,
}

impl ResourceDescriptor {
    /// Creates a resource descriptor with the `text/plain` content type.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityDomainError::EmptyCapabilityName`] when the name
    /// is empty after trimming.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, CapabilityDomainError> {
        Ok(Self {
            name: normalize_name(CapabilityKind::Resource, name)?,
            description: description.into(),
            mime_type: default_mime_type(),
        })
    }

    /// Sets the content-type tag.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Returns the resource name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the resource description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the content-type tag.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

/// One named argument of a prompt template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptArgument {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    required: bool,
}

impl PromptArgument {
    /// Creates a prompt argument.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityDomainError::EmptyPromptArgumentName`] when the
    /// name is empty after trimming.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Result<Self, CapabilityDomainError> {
        let normalized = name.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(CapabilityDomainError::EmptyPromptArgumentName);
        }
        Ok(Self {
            name: normalized,
            description: description.into(),
            required,
        })
    }

    /// Returns the argument name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the argument description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns whether the argument must be supplied.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }
}

/// Advertised metadata of a prompt template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptDescriptor {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    arguments: Vec<PromptArgument>,
}

impl PromptDescriptor {
    /// Creates a prompt descriptor without arguments.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityDomainError::EmptyCapabilityName`] when the name
    /// is empty after trimming.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, CapabilityDomainError> {
        Ok(Self {
            name: normalize_name(CapabilityKind::Prompt, name)?,
            description: description.into(),
            arguments: Vec::new(),
        })
    }

    /// Sets the ordered argument list.
    #[must_use]
    pub fn with_arguments(mut self, arguments: impl IntoIterator<Item = PromptArgument>) -> Self {
        self.arguments = arguments.into_iter().collect();
        self
    }

    /// Returns the prompt name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the prompt description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the ordered argument list.
    #[must_use]
    pub fn arguments(&self) -> &[PromptArgument] {
        &self.arguments
    }

    /// Returns the names of required arguments missing from `args`.
    #[must_use]
    pub fn missing_required<'a>(&'a self, args: &Map<String, Value>) -> Vec<&'a str> {
        self.arguments
            .iter()
            .filter(|argument| argument.is_required() && !args.contains_key(argument.name()))
            .map(PromptArgument::name)
            .collect()
    }
}

/// Tagged variant over the three descriptor kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CapabilityDescriptor {
    /// Tool metadata.
    Tool(ToolDescriptor),
    /// Resource metadata.
    Resource(ResourceDescriptor),
    /// Prompt metadata.
    Prompt(PromptDescriptor),
}

impl CapabilityDescriptor {
    /// Returns the descriptor kind.
    #[must_use]
    pub const fn kind(&self) -> CapabilityKind {
        match self {
            Self::Tool(_) => CapabilityKind::Tool,
            Self::Resource(_) => CapabilityKind::Resource,
            Self::Prompt(_) => CapabilityKind::Prompt,
        }
    }

    /// Returns the capability name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Tool(tool) => tool.name(),
            Self::Resource(resource) => resource.name(),
            Self::Prompt(prompt) => prompt.name(),
        }
    }

    /// Re-checks invariants of a descriptor received from another context.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityDomainError::EmptyCapabilityName`] when the
    /// deserialized name is blank.
    pub fn validate(&self) -> Result<(), CapabilityDomainError> {
        if self.name().trim().is_empty() {
            return Err(CapabilityDomainError::EmptyCapabilityName(self.kind()));
        }
        Ok(())
    }
}

impl From<ToolDescriptor> for CapabilityDescriptor {
    fn from(tool: ToolDescriptor) -> Self {
        Self::Tool(tool)
    }
}

impl From<ResourceDescriptor> for CapabilityDescriptor {
    fn from(resource: ResourceDescriptor) -> Self {
        Self::Resource(resource)
    }
}

impl From<PromptDescriptor> for CapabilityDescriptor {
    fn from(prompt: PromptDescriptor) -> Self {
        Self::Prompt(prompt)
    }
}
