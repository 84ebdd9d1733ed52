use tracing::debug;

use crate::surface::{Group, NodeId, Surface};
use crate::unit::{UnitKind, classify};

/// Minimum groupable members a run needs before it is wrapped.
pub const MIN_GROUP_SIZE: usize = 2;

#[derive(Default)]
struct GroupStats {
    tool_count: usize,
    thinking_count: usize,
    thinking_secs: u64,
    has_errors: bool,
}

fn collect_stats(surface: &Surface, members: &[NodeId]) -> GroupStats {
    let mut stats = GroupStats::default();
    for member in members {
        let Some(unit) = surface.unit(*member) else {
            continue;
        };
        let facts = classify(unit);
        if unit.kind == UnitKind::Thinking {
            stats.thinking_count += 1;
            stats.thinking_secs += facts.thinking_secs.unwrap_or(0);
        } else if facts.groupable {
            stats.tool_count += 1;
        }
        if facts.has_error {
            stats.has_errors = true;
        }
    }
    stats
}

fn build_label(stats: &GroupStats) -> String {
    let mut parts = Vec::new();
    if stats.tool_count > 0 {
        let plural = if stats.tool_count == 1 { "" } else { "s" };
        parts.push(format!("{} tool call{plural}", stats.tool_count));
    }
    if stats.thinking_count > 0 {
        if stats.thinking_secs > 0 {
            parts.push(format!("Thought for {}s", stats.thinking_secs));
        } else {
            parts.push(format!("{} thinking", stats.thinking_count));
        }
    }
    parts.join(" · ")
}

fn materialize(surface: &mut Surface, parent: NodeId, members: &[NodeId], streaming: bool) -> NodeId {
    debug_assert!(!members.is_empty());
    let stats = collect_stats(surface, members);
    let mut group = Group::new(build_label(&stats), streaming);
    group.has_errors = stats.has_errors;
    debug!(label = %group.label, streaming, members = members.len(), "materializing group");
    let wrapper = surface.create_group(group);
    surface.insert_before(parent, wrapper, members[0]);
    for member in members {
        surface.append_child(wrapper, *member);
    }
    wrapper
}

/// Recomputes a wrapper's label and aggregate status from its current
/// members. Call after a member unit changes status in place.
pub fn refresh_group(surface: &mut Surface, wrapper: NodeId) {
    let members = surface.children(wrapper).to_vec();
    let stats = collect_stats(surface, &members);
    let label = build_label(&stats);
    if let Some(group) = surface.group_mut(wrapper) {
        group.label = label;
        group.has_errors = stats.has_errors;
    }
}

struct Run {
    members: Vec<NodeId>,
    groupable: usize,
}

fn close_run(current: &mut Option<Run>, runs: &mut Vec<Run>) {
    if let Some(run) = current.take()
        && run.groupable >= MIN_GROUP_SIZE
    {
        runs.push(run);
    }
}

/// Batch grouping over a fully rendered, ungrouped sequence.
///
/// Scans the root's children left to right, accumulating runs of groupable
/// units (absorbing plain text into an open run), closing a run at every
/// chain-breaker or opaque unit, and wrapping each run whose groupable count
/// meets [`MIN_GROUP_SIZE`]. Kept runs are materialized from the last to the
/// first so earlier insertion points stay valid. Call once, after a stored
/// transcript segment has been replayed.
pub fn group_transcript(surface: &mut Surface) {
    let parent = surface.root();
    let children = surface.children(parent).to_vec();
    if children.len() < MIN_GROUP_SIZE {
        return;
    }

    let mut runs: Vec<Run> = Vec::new();
    let mut current: Option<Run> = None;
    for child in children {
        let Some(unit) = surface.unit(child) else {
            close_run(&mut current, &mut runs);
            continue;
        };
        let facts = classify(unit);
        if facts.chain_breaker {
            close_run(&mut current, &mut runs);
        } else if facts.groupable {
            let run = current.get_or_insert_with(|| Run {
                members: Vec::new(),
                groupable: 0,
            });
            run.members.push(child);
            run.groupable += 1;
        } else if facts.transparent && current.is_some() {
            if let Some(run) = current.as_mut() {
                run.members.push(child);
            }
        } else {
            close_run(&mut current, &mut runs);
        }
    }
    close_run(&mut current, &mut runs);

    for run in runs.iter().rev() {
        materialize(surface, parent, &run.members, false);
    }
}

struct ActiveGroup {
    pending: Vec<NodeId>,
    groupable: usize,
    wrapper: Option<NodeId>,
}

/// Online single-pass grouping over a live turn; no lookahead.
///
/// The first groupable unit only opens a pending buffer — the visible
/// wrapper appears when a second groupable unit arrives, which avoids
/// wrapper flicker for the common single-tool-call turn. Finalization
/// unwraps a wrapper whose surviving groupable members fall short of the
/// threshold, so the streamed structure converges on what the batch pass
/// would have produced.
#[derive(Default)]
pub struct StreamingGroup {
    active: Option<ActiveGroup>,
}

impl StreamingGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a run is open (buffered or wrapped).
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Integrates one just-rendered unit that is already the last child of
    /// the surface root.
    pub fn integrate(&mut self, surface: &mut Surface, node: NodeId) {
        let Some(unit) = surface.unit(node) else {
            self.finalize(surface);
            return;
        };
        let facts = classify(unit);
        if facts.chain_breaker || (!facts.groupable && !facts.transparent) {
            self.finalize(surface);
            return;
        }

        if facts.transparent {
            // Text joins an open run but never opens one.
            if let Some(active) = self.active.as_mut() {
                match active.wrapper {
                    Some(wrapper) => surface.append_child(wrapper, node),
                    None => active.pending.push(node),
                }
            }
            return;
        }

        match self.active.as_mut() {
            None => {
                self.active = Some(ActiveGroup {
                    pending: vec![node],
                    groupable: 1,
                    wrapper: None,
                });
            }
            Some(active) => {
                active.groupable += 1;
                if let Some(wrapper) = active.wrapper {
                    surface.append_child(wrapper, node);
                    refresh_group(surface, wrapper);
                } else {
                    // Second groupable unit: materialize the wrapper and move
                    // the buffered members (including absorbed text) into it.
                    active.pending.push(node);
                    let root = surface.root();
                    let wrapper = materialize(surface, root, &active.pending, true);
                    active.wrapper = Some(wrapper);
                    active.pending.clear();
                }
            }
        }
    }

    /// Ends the current run at a chain-breaker, an opaque unit, or end of
    /// turn.
    ///
    /// A run that never grew a wrapper needs nothing — its units already sit
    /// inline. A wrapper whose members, recounted at this point, fall short
    /// of [`MIN_GROUP_SIZE`] groupable units is unwrapped: its children are
    /// relocated back into the surrounding sequence in original order and the
    /// wrapper is discarded. Otherwise the streaming marker is cleared and
    /// the label/status are recomputed once.
    pub fn finalize(&mut self, surface: &mut Surface) {
        let Some(active) = self.active.take() else {
            return;
        };
        let Some(wrapper) = active.wrapper else {
            return;
        };

        let members = surface.children(wrapper).to_vec();
        let groupable = members
            .iter()
            .filter_map(|member| surface.unit(*member))
            .filter(|unit| classify(unit).groupable)
            .count();
        if groupable < MIN_GROUP_SIZE {
            debug!(members = members.len(), "unwrapping under-threshold group");
            if let Some(parent) = surface.parent(wrapper) {
                for member in members {
                    surface.insert_before(parent, member, wrapper);
                }
            }
            surface.remove(wrapper);
            return;
        }

        if let Some(group) = surface.group_mut(wrapper) {
            group.streaming = false;
        }
        refresh_group(surface, wrapper);
    }
}
