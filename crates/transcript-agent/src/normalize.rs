use serde_json::Value;
use tracing::debug;
use transcript_core::adapter::TOOL_BASH;
use transcript_core::{Chunk, CommandPolicy};

use crate::message::{ContentBlock, ContentDelta, RawMessage, StreamEventBody};

/// Outcome of normalizing one raw message: chunks in content order, plus a
/// session id when the message was a lifecycle-init event.
#[derive(Debug, Default, PartialEq)]
pub struct MessageOutput {
    pub chunks: Vec<Chunk>,
    pub session_id: Option<String>,
}

/// Converts one raw upstream message into zero or more canonical chunks.
///
/// Content order is preserved — a message only ever expands or filters,
/// never reorders. Shell invocations pass through the command policy, which
/// substitutes a `Blocked` chunk for vetoed commands. Unknown message kinds
/// are dropped.
pub fn chunks_for_message(message: RawMessage, policy: &CommandPolicy) -> MessageOutput {
    let mut output = MessageOutput::default();
    match message {
        RawMessage::System(system) => {
            if system.subtype.as_deref() == Some("init")
                && let Some(session_id) = system.session_id
            {
                output.session_id = Some(session_id);
            }
            // Other lifecycle events carry no user-visible payload.
        }
        RawMessage::Assistant(assistant) => {
            if let Some(body) = assistant.message {
                for block in body.content {
                    match block {
                        ContentBlock::Text { text } if !text.is_empty() => {
                            output.chunks.push(Chunk::text(text));
                        }
                        ContentBlock::ToolUse { id, name, input } => {
                            output.chunks.push(Chunk::ToolUse {
                                id: id.unwrap_or_else(fallback_tool_id),
                                name,
                                input,
                            });
                        }
                        _ => {}
                    }
                }
            }
        }
        RawMessage::User(user) => {
            let parent_id = user.parent_tool_use_id;
            if let Some(result) = user.tool_use_result
                && let Some(id) = parent_id.clone()
            {
                output.chunks.push(Chunk::ToolResult {
                    id,
                    content: stringify(&result),
                    is_error: false,
                });
            }
            if let Some(body) = user.message {
                for block in body.content {
                    if let ContentBlock::ToolResult {
                        tool_use_id,
                        content,
                        is_error,
                    } = block
                    {
                        output.chunks.push(Chunk::ToolResult {
                            id: tool_use_id
                                .or_else(|| parent_id.clone())
                                .unwrap_or_default(),
                            content: stringify(&content),
                            is_error,
                        });
                    }
                }
            }
        }
        RawMessage::StreamEvent(stream_event) => match stream_event.event {
            Some(StreamEventBody::ContentBlockStart {
                content_block: Some(block),
            }) => match block {
                // Surface the invocation before its arguments finish
                // streaming.
                ContentBlock::ToolUse { id, name, input } => {
                    output.chunks.push(Chunk::ToolUse {
                        id: id.unwrap_or_else(fallback_tool_id),
                        name,
                        input,
                    });
                }
                ContentBlock::Text { text } if !text.is_empty() => {
                    output.chunks.push(Chunk::text(text));
                }
                _ => {}
            },
            Some(StreamEventBody::ContentBlockDelta {
                delta: Some(ContentDelta::TextDelta { text }),
            }) if !text.is_empty() => {
                output.chunks.push(Chunk::text(text));
            }
            _ => {}
        },
        RawMessage::Result(_) => {}
        RawMessage::Error(error_message) => {
            if let Some(error) = error_message.error {
                output.chunks.push(Chunk::error(error));
            }
        }
        RawMessage::Unknown => {
            debug!("dropping unrecognized upstream message kind");
        }
    }

    output.chunks = output
        .chunks
        .into_iter()
        .map(|chunk| gate_shell_invocation(chunk, policy))
        .collect();
    output
}

// The veto is presentation-layer only: the invocation disappears from the
// UI-facing sequence, nothing more.
fn gate_shell_invocation(chunk: Chunk, policy: &CommandPolicy) -> Chunk {
    if let Chunk::ToolUse { name, input, .. } = &chunk
        && name == TOOL_BASH
    {
        let command = input.get("command").and_then(Value::as_str).unwrap_or("");
        if policy.is_blocked(command) {
            return Chunk::blocked(format!("Blocked command: {command}"));
        }
    }
    chunk
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Fallback invocation id when upstream omits one: timestamp plus a random
/// tail, unique enough for correlation within a transcript.
fn fallback_tool_id() -> String {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    let tail = uuid::Uuid::new_v4().simple().to_string();
    format!("tool-{millis}-{}", &tail[..8])
}
