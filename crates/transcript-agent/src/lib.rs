//! Message normalizer for the upstream autonomous-agent CLI.
//!
//! The crate turns the agent's raw, loosely-typed message stream into the
//! ordered chunk sequence consumed by `transcript-core`. The transducer is
//! pull-based and cooperative: the consumer drives it one chunk at a time,
//! the only suspension point is awaiting the next upstream message, and a
//! cancellation request is observed at the next resumption — one interrupt
//! goes upstream and the stream still terminates with `Done`.
//!
//! ```no_run
//! use transcript_agent::prelude::*;
//! use transcript_core::Transcript;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let service = AgentService::new(AgentConfig::new("/path/to/vault"));
//! let mut stream = service.query("Summarize today's notes").await;
//! let mut transcript = Transcript::new();
//! while let Some(chunk) = stream.next_chunk().await {
//!     transcript.push_chunk(&chunk);
//!     if chunk.is_done() {
//!         break;
//!     }
//! }
//! # }
//! ```

/// Transport and service error taxonomies.
pub mod errors;
/// Raw upstream message model.
pub mod message;
/// Per-message normalization into canonical chunks.
pub mod normalize;
/// Common imports for typical usage.
pub mod prelude;
/// Pull-based query stream and cancellation.
pub mod query;
/// Agent CLI discovery.
pub mod resolver;
/// Session resumption handle.
pub mod session;
/// Service entry point and configuration.
pub mod service;
/// Upstream transport abstraction and the subprocess implementation.
pub mod transport;

pub use errors::{AgentError, TransportError};
pub use message::RawMessage;
pub use normalize::{MessageOutput, chunks_for_message};
pub use query::{CancelHandle, QueryStream};
pub use resolver::find_agent_cli;
pub use service::{AgentConfig, AgentService};
pub use session::SessionHandle;
pub use transport::{AgentTransport, CliTransport, Interrupter, MessageStream, QueryRequest, TurnHandle};
