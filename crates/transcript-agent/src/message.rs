use serde::Deserialize;

/// Raw upstream message kinds, decoded one per stream item.
///
/// The union is closed on purpose: every known kind has exactly one handling
/// rule in the normalizer, and anything else lands on `Unknown`, which the
/// normalizer silently drops so new upstream kinds cannot break the pipeline.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawMessage {
    /// Lifecycle events; the `init` subtype carries the session id.
    System(SystemMessage),
    /// One assistant turn with ordered content blocks.
    Assistant(AssistantMessage),
    /// A user turn, which may carry tool results.
    User(UserMessage),
    /// Incremental delta event while a turn streams.
    StreamEvent(StreamEventMessage),
    /// Final summary; carries no durable payload.
    Result(ResultMessage),
    /// An upstream-reported failure.
    Error(ErrorMessage),
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SystemMessage {
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub message: Option<MessageBody>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct UserMessage {
    /// Top-level result payload paired with the invocation that produced it.
    #[serde(default)]
    pub tool_use_result: Option<serde_json::Value>,
    #[serde(default)]
    pub parent_tool_use_id: Option<String>,
    #[serde(default)]
    pub message: Option<MessageBody>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

/// Content blocks inside assistant/user message bodies.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        #[serde(default)]
        id: Option<String>,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    ToolResult {
        #[serde(default)]
        tool_use_id: Option<String>,
        #[serde(default)]
        content: serde_json::Value,
        #[serde(default)]
        is_error: bool,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct StreamEventMessage {
    #[serde(default)]
    pub event: Option<StreamEventBody>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEventBody {
    /// Announces a new content block; tool invocations surface here before
    /// their arguments finish streaming.
    ContentBlockStart {
        #[serde(default)]
        content_block: Option<ContentBlock>,
    },
    ContentBlockDelta {
        #[serde(default)]
        delta: Option<ContentDelta>,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentDelta {
    TextDelta {
        #[serde(default)]
        text: String,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ResultMessage {}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ErrorMessage {
    #[serde(default)]
    pub error: Option<String>,
}
