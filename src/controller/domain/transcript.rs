//! Chat transcript shown in the agent UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptRole {
    /// Text typed by the user.
    User,
    /// Final model answer.
    Assistant,
    /// A tool call made on the user's behalf.
    Tool,
    /// A chat-visible error.
    Error,
}

/// One line of the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Author.
    pub role: TranscriptRole,
    /// Rendered text.
    pub text: String,
    /// When the entry was appended.
    pub at: DateTime<Utc>,
}

/// Append-only chat transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    /// Appends an entry.
    pub fn push(&mut self, role: TranscriptRole, text: impl Into<String>, at: DateTime<Utc>) {
        self.entries.push(TranscriptEntry {
            role,
            text: text.into(),
            at,
        });
    }

    /// Returns all entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Returns the newest entry.
    #[must_use]
    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    /// Returns the entries written by `role`.
    pub fn by_role(&self, role: TranscriptRole) -> impl Iterator<Item = &TranscriptEntry> {
        self.entries.iter().filter(move |entry| entry.role == role)
    }
}
