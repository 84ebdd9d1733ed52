use serde::{Deserialize, Serialize};

/// Canonical unit of agent-turn output.
///
/// Chunks are the vocabulary exchanged between the message normalizer, the
/// command policy filter, and the transcript surface. Ordering within a turn
/// is preserved end-to-end: producers may filter or split upstream messages
/// but never reorder them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Chunk {
    /// Conversational text, possibly an incremental delta.
    Text { content: String },
    /// A tool invocation requested by the agent.
    ///
    /// `id` is a stable identifier used to correlate the later result with
    /// this invocation.
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// Output produced for an earlier invocation, correlated by `id`.
    ///
    /// A result whose `id` matches no prior invocation is still a valid,
    /// independently renderable event (background subagent output).
    ToolResult {
        id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
    /// A shell invocation vetoed by the command policy filter.
    Blocked { content: String },
    /// A failure surfaced as content; the turn still terminates normally.
    Error { content: String },
    /// Terminal marker; exactly one per turn, on every path.
    Done,
}

impl Chunk {
    /// Creates a text chunk.
    pub fn text(content: impl Into<String>) -> Self {
        Chunk::Text {
            content: content.into(),
        }
    }

    /// Creates a tool invocation chunk.
    pub fn tool_use(
        id: impl Into<String>,
        name: impl Into<String>,
        input: serde_json::Value,
    ) -> Self {
        Chunk::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    /// Creates a tool result chunk.
    pub fn tool_result(id: impl Into<String>, content: impl Into<String>, is_error: bool) -> Self {
        Chunk::ToolResult {
            id: id.into(),
            content: content.into(),
            is_error,
        }
    }

    /// Creates a blocked-command chunk.
    pub fn blocked(content: impl Into<String>) -> Self {
        Chunk::Blocked {
            content: content.into(),
        }
    }

    /// Creates an error chunk.
    pub fn error(content: impl Into<String>) -> Self {
        Chunk::Error {
            content: content.into(),
        }
    }

    /// Returns true for the terminal marker.
    pub fn is_done(&self) -> bool {
        matches!(self, Chunk::Done)
    }
}
