//! Common imports for typical normalizer usage.
//!
//! This module intentionally exports the most frequently used service and
//! stream types so application code needs fewer import lines.
pub use crate::{
    AgentConfig, AgentService, AgentTransport, CancelHandle, QueryRequest, QueryStream,
    SessionHandle, TransportError, TurnHandle,
};
pub use transcript_core::{Chunk, CommandPolicy, PolicyConfig};
