//! Order-preserving transcript pipeline for autonomous-agent event streams.
//!
//! The crate turns a canonical chunk sequence (text, tool invocations, tool
//! results, control markers) into a collapsible transcript: consecutive noisy
//! activity is clustered into summarized groups while conversational text
//! stays visible. Grouping exists in two modes — online while a turn streams
//! and batch at replay time — and both converge on the same final structure.
//!
//! ```
//! use transcript_core::{Chunk, Transcript};
//!
//! let mut transcript = Transcript::new();
//! transcript.push_chunk(&Chunk::text("Let me look around."));
//! transcript.push_chunk(&Chunk::tool_use(
//!     "t1",
//!     "Bash",
//!     serde_json::json!({"command": "ls"}),
//! ));
//! transcript.push_chunk(&Chunk::tool_result("t1", "notes.md", false));
//! transcript.push_chunk(&Chunk::Done);
//! let outline = transcript.outline();
//! assert_eq!(outline.len(), 2);
//! ```

/// Chunk-to-unit render adapters and tool caption helpers.
pub mod adapter;
/// Canonical chunk vocabulary.
pub mod chunk;
/// Batch and streaming grouping engine.
pub mod group;
/// Interrupt sentinel classification.
pub mod interrupt;
/// Process-wide tracing bootstrap.
pub mod observability;
/// Shell-command blocklist filter.
pub mod policy;
/// UI-agnostic transcript container.
pub mod surface;
/// Session-level transcript context.
pub mod transcript;
/// Rendered units and grouping classification.
pub mod unit;

pub use chunk::Chunk;
pub use group::{MIN_GROUP_SIZE, StreamingGroup, group_transcript, refresh_group};
pub use interrupt::{is_bracket_interrupt_text, is_compaction_canceled_stderr, is_interrupt_signal_text};
pub use observability::init_observability;
pub use policy::{CommandPolicy, DEFAULT_BLOCKED_COMMANDS, PolicyConfig};
pub use surface::{Group, NodeId, OutlineNode, Surface};
pub use transcript::Transcript;
pub use unit::{Classification, RenderedUnit, UnitKind, UnitStatus, classify};
