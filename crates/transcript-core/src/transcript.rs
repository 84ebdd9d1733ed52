use std::collections::HashMap;

use tracing::debug;

use crate::adapter::{apply_tool_result, render_chunk, standalone_result_unit};
use crate::chunk::Chunk;
use crate::group::{StreamingGroup, group_transcript, refresh_group};
use crate::surface::{NodeId, OutlineNode, Surface};
use crate::unit::RenderedUnit;

/// Session-level transcript context.
///
/// Owns the surface, the invocation-id correlation table, and the live
/// streaming-group state. All mutation happens on the single rendering task;
/// the grouping engine never reads the correlation table, only the
/// classification facts the units expose.
pub struct Transcript {
    surface: Surface,
    tool_nodes: HashMap<String, NodeId>,
    streaming: StreamingGroup,
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            surface: Surface::new(),
            tool_nodes: HashMap::new(),
            streaming: StreamingGroup::new(),
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Structural snapshot of the current transcript.
    pub fn outline(&self) -> Vec<OutlineNode> {
        self.surface.outline()
    }

    /// Renders one canonical chunk into the live transcript, grouping
    /// online as the turn streams.
    pub fn push_chunk(&mut self, chunk: &Chunk) {
        self.dispatch(chunk, true);
    }

    /// Renders one stored chunk without online grouping. Call
    /// [`Transcript::group_all`] once the replayed segment is complete.
    pub fn replay_chunk(&mut self, chunk: &Chunk) {
        self.dispatch(chunk, false);
    }

    /// Admits a host-produced unit (thinking block, footer, compaction
    /// boundary) into the live turn.
    pub fn push_unit(&mut self, unit: RenderedUnit) -> NodeId {
        self.insert_unit(unit, true)
    }

    /// Admits a host-produced unit during replay.
    pub fn replay_unit(&mut self, unit: RenderedUnit) -> NodeId {
        self.insert_unit(unit, false)
    }

    /// Forces streaming finalization at end of turn.
    pub fn finish_turn(&mut self) {
        self.streaming.finalize(&mut self.surface);
    }

    /// Batch grouping for replayed segments: wraps the same runs the
    /// streaming pass would have produced live.
    pub fn group_all(&mut self) {
        group_transcript(&mut self.surface);
    }

    fn dispatch(&mut self, chunk: &Chunk, live: bool) {
        match chunk {
            Chunk::Done => {
                if live {
                    self.finish_turn();
                }
            }
            Chunk::ToolResult {
                id,
                content,
                is_error,
            } => self.apply_result(id, content, *is_error, live),
            Chunk::ToolUse { id, .. } => {
                if let Some(unit) = render_chunk(chunk) {
                    let node = self.insert_unit(unit, live);
                    self.tool_nodes.insert(id.clone(), node);
                }
            }
            _ => {
                if let Some(unit) = render_chunk(chunk) {
                    self.insert_unit(unit, live);
                }
            }
        }
    }

    fn insert_unit(&mut self, unit: RenderedUnit, live: bool) -> NodeId {
        let node = self.surface.append_unit(self.surface.root(), unit);
        if live {
            self.streaming.integrate(&mut self.surface, node);
        }
        node
    }

    fn apply_result(&mut self, id: &str, content: &str, is_error: bool, live: bool) {
        match self.tool_nodes.get(id) {
            Some(&node) => {
                if let Some(unit) = self.surface.unit_mut(node) {
                    apply_tool_result(unit, content, is_error);
                }
                // A status change may feed a wrapper's aggregate label/icon.
                if let Some(parent) = self.surface.parent(node)
                    && self.surface.group(parent).is_some()
                {
                    refresh_group(&mut self.surface, parent);
                }
            }
            None => {
                debug!(id, "result without prior invocation; rendering standalone");
                self.insert_unit(standalone_result_unit(content, is_error), live);
            }
        }
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}
