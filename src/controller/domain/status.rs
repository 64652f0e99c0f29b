//! Status line of the agent UI.

use std::fmt;

/// What the controller is doing, as shown in the status line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ControllerStatus {
    /// No page is active.
    #[default]
    Idle,
    /// A page is active but its directory has not arrived yet.
    AwaitingDirectory,
    /// The directory is known and calls are accepted.
    Ready {
        /// Number of tools offered by the page.
        tool_count: usize,
    },
    /// A tool call is in flight.
    Working {
        /// Tool being executed.
        tool: String,
    },
    /// The last chat turn failed.
    Failed {
        /// Failure shown to the user.
        reason: String,
    },
}

impl ControllerStatus {
    /// Returns `true` when the controller accepts tool calls.
    #[must_use]
    pub const fn accepts_calls(&self) -> bool {
        !matches!(self, Self::Idle | Self::AwaitingDirectory)
    }
}

impl fmt::Display for ControllerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::AwaitingDirectory => f.write_str("waiting for tools on the page"),
            Self::Ready { tool_count } => write!(f, "{tool_count} tool(s) available"),
            Self::Working { tool } => write!(f, "running tool {tool}"),
            Self::Failed { reason } => write!(f, "error: {reason}"),
        }
    }
}
