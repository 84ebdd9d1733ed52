use once_cell::sync::Lazy;
use regex::Regex;

/// What a rendered unit fundamentally is, as far as the transcript and the
/// grouping engine are concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// A tool invocation view.
    ToolCall,
    /// A file write/edit view.
    WriteEdit,
    /// Sub-agent activity.
    Subagent,
    /// A reasoning block; its caption may carry a duration ("Thought for 12s").
    Thinking,
    /// Plain conversational prose.
    Text,
    /// An interactive question awaiting a user answer.
    AskUserQuestion,
    /// Turn-boundary footer.
    ResponseFooter,
    /// Context-compaction boundary marker.
    CompactBoundary,
    /// A standalone result with no prior invocation (async subagent output).
    ToolResult,
    /// A command vetoed by the policy filter.
    Blocked,
    /// A surfaced failure.
    Error,
    /// Control text disguised as content (interrupt sentinels).
    Signal,
}

/// Lifecycle status shown by a unit's indicator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitStatus {
    Running,
    Completed,
    Error,
    Blocked,
}

/// One on-surface element produced from exactly one chunk (or one host-side
/// view), carrying the facts the grouping engine classifies on.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedUnit {
    pub kind: UnitKind,
    /// Primary caption (tool label, message text, "Thought for 12s", ...).
    pub caption: String,
    /// Secondary line: tool summary or result payload.
    pub detail: Option<String>,
    pub status: UnitStatus,
}

impl RenderedUnit {
    pub fn new(kind: UnitKind, caption: impl Into<String>) -> Self {
        Self {
            kind,
            caption: caption.into(),
            detail: None,
            status: UnitStatus::Completed,
        }
    }

    /// Attaches a secondary line.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_status(mut self, status: UnitStatus) -> Self {
        self.status = status;
        self
    }

    /// A reasoning block; pass the displayed caption, e.g. "Thought for 12s".
    pub fn thinking(caption: impl Into<String>) -> Self {
        Self::new(UnitKind::Thinking, caption)
    }

    /// Plain conversational prose.
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(UnitKind::Text, content)
    }

    /// Turn-boundary footer.
    pub fn response_footer(caption: impl Into<String>) -> Self {
        Self::new(UnitKind::ResponseFooter, caption)
    }

    /// Context-compaction boundary marker.
    pub fn compact_boundary() -> Self {
        Self::new(UnitKind::CompactBoundary, "Context compacted")
    }
}

/// Classification facts for one rendered unit.
///
/// Pure data decoupled from any live container, so the batch/streaming
/// grouping equivalence can be exercised with synthetic records and no
/// rendering surface at all.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Classification {
    /// Counts toward the group threshold and joins runs.
    pub groupable: bool,
    /// Always terminates the current run; never grouped.
    pub chain_breaker: bool,
    /// Absorbed into an open run but never opens one.
    pub transparent: bool,
    /// Feeds the group's aggregate status.
    pub has_error: bool,
    /// Parsed reasoning duration, when the unit is a thinking block.
    pub thinking_secs: Option<u64>,
}

static THINKING_SECONDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)s").expect("static pattern"));

/// Extracts the first integer immediately followed by `s` from a thinking
/// caption ("Thought for 12s" -> 12).
pub fn parse_thinking_secs(caption: &str) -> Option<u64> {
    THINKING_SECONDS
        .captures(caption)
        .and_then(|captures| captures.get(1))
        .and_then(|digits| digits.as_str().parse().ok())
}

/// Classifies one rendered unit for the grouping engine.
///
/// Tool calls, write/edit views, subagent activity, thinking blocks, and
/// standalone results are groupable. Interactive questions, footers, and
/// compaction boundaries break chains. Plain text is transparent. Everything
/// else is opaque-inline: neither fact set, so it ends the current run and
/// stays visible.
pub fn classify(unit: &RenderedUnit) -> Classification {
    let mut facts = Classification {
        has_error: unit.status == UnitStatus::Error,
        ..Classification::default()
    };
    match unit.kind {
        UnitKind::ToolCall | UnitKind::WriteEdit | UnitKind::Subagent | UnitKind::ToolResult => {
            facts.groupable = true;
        }
        UnitKind::Thinking => {
            facts.groupable = true;
            facts.thinking_secs = parse_thinking_secs(&unit.caption);
        }
        UnitKind::AskUserQuestion | UnitKind::ResponseFooter | UnitKind::CompactBoundary => {
            facts.chain_breaker = true;
        }
        UnitKind::Text => {
            facts.transparent = true;
        }
        UnitKind::Blocked | UnitKind::Error | UnitKind::Signal => {}
    }
    facts
}
