use serde_json::Value;

use crate::chunk::Chunk;
use crate::interrupt::is_interrupt_signal_text;
use crate::unit::{RenderedUnit, UnitKind, UnitStatus};

pub const TOOL_READ: &str = "Read";
pub const TOOL_WRITE: &str = "Write";
pub const TOOL_EDIT: &str = "Edit";
pub const TOOL_BASH: &str = "Bash";
pub const TOOL_GLOB: &str = "Glob";
pub const TOOL_GREP: &str = "Grep";
pub const TOOL_LS: &str = "LS";
pub const TOOL_WEB_SEARCH: &str = "WebSearch";
pub const TOOL_WEB_FETCH: &str = "WebFetch";
pub const TOOL_SKILL: &str = "Skill";
pub const TOOL_TODO_WRITE: &str = "TodoWrite";
pub const TOOL_TASK: &str = "Task";
pub const TOOL_ASK_USER_QUESTION: &str = "AskUserQuestion";
pub const TOOL_ENTER_PLAN_MODE: &str = "EnterPlanMode";
pub const TOOL_EXIT_PLAN_MODE: &str = "ExitPlanMode";

fn input_str<'a>(input: &'a Value, key: &str) -> &'a str {
    input.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Last path segment, tolerant of Windows separators.
pub fn file_name_only(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    let normalized = path.replace('\\', "/");
    normalized
        .rsplit('/')
        .next()
        .unwrap_or(normalized.as_str())
        .to_string()
}

fn shorten_path(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    let normalized = path.replace('\\', "/");
    let parts: Vec<&str> = normalized.split('/').collect();
    if parts.len() <= 3 {
        return normalized;
    }
    format!(".../{}", parts[parts.len() - 2..].join("/"))
}

fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{truncated}...")
}

fn todo_counts(input: &Value) -> Option<(usize, usize)> {
    let todos = input.get("todos")?.as_array()?;
    if todos.is_empty() {
        return None;
    }
    let completed = todos
        .iter()
        .filter(|todo| todo.get("status").and_then(Value::as_str) == Some("completed"))
        .count();
    Some((completed, todos.len()))
}

/// Display name for a tool invocation header.
pub fn tool_display_name(name: &str, input: &Value) -> String {
    match name {
        TOOL_TODO_WRITE => match todo_counts(input) {
            Some((completed, total)) => format!("Tasks {completed}/{total}"),
            None => "Tasks".to_string(),
        },
        TOOL_ENTER_PLAN_MODE => "Entering plan mode".to_string(),
        TOOL_EXIT_PLAN_MODE => "Plan complete".to_string(),
        _ => name.to_string(),
    }
}

/// Short argument summary shown next to the tool name.
pub fn tool_summary(name: &str, input: &Value) -> String {
    match name {
        TOOL_READ | TOOL_WRITE | TOOL_EDIT => file_name_only(input_str(input, "file_path")),
        TOOL_BASH => truncate_text(input_str(input, "command"), 60),
        TOOL_GLOB | TOOL_GREP => input_str(input, "pattern").to_string(),
        TOOL_WEB_SEARCH => truncate_text(input_str(input, "query"), 60),
        TOOL_WEB_FETCH => truncate_text(input_str(input, "url"), 60),
        TOOL_LS => {
            let path = input_str(input, "path");
            file_name_only(if path.is_empty() { "." } else { path })
        }
        TOOL_SKILL => input_str(input, "skill").to_string(),
        _ => String::new(),
    }
}

/// Combined name+argument phrase used as the unit caption.
pub fn tool_label(name: &str, input: &Value) -> String {
    match name {
        TOOL_READ | TOOL_WRITE | TOOL_EDIT => {
            let path = shorten_path(input_str(input, "file_path"));
            let path = if path.is_empty() { "file".to_string() } else { path };
            format!("{name}: {path}")
        }
        TOOL_BASH => {
            let command = input_str(input, "command");
            let command = if command.is_empty() { "command" } else { command };
            format!("Bash: {}", truncate_text(command, 40))
        }
        TOOL_GLOB => format!("Glob: {}", non_empty_or(input_str(input, "pattern"), "files")),
        TOOL_GREP => format!("Grep: {}", non_empty_or(input_str(input, "pattern"), "pattern")),
        TOOL_WEB_SEARCH => {
            let query = non_empty_or(input_str(input, "query"), "search");
            format!("WebSearch: {}", truncate_text(&query, 40))
        }
        TOOL_WEB_FETCH => {
            let url = non_empty_or(input_str(input, "url"), "url");
            format!("WebFetch: {}", truncate_text(&url, 40))
        }
        TOOL_LS => {
            let path = shorten_path(input_str(input, "path"));
            format!("LS: {}", non_empty_or(&path, "."))
        }
        TOOL_TODO_WRITE => match todo_counts(input) {
            Some((completed, total)) => format!("Tasks ({completed}/{total})"),
            None => "Tasks".to_string(),
        },
        TOOL_SKILL => format!("Skill: {}", non_empty_or(input_str(input, "skill"), "skill")),
        TOOL_ENTER_PLAN_MODE => "Entering plan mode".to_string(),
        TOOL_EXIT_PLAN_MODE => "Plan complete".to_string(),
        _ => name.to_string(),
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Heuristic for results that represent a denied/vetoed action rather than a
/// tool failure.
pub fn is_blocked_tool_result(content: &str, is_error: bool) -> bool {
    let lower = content.to_lowercase();
    lower.contains("blocked by blocklist")
        || lower.contains("outside the vault")
        || lower.contains("access denied")
        || lower.contains("user denied")
        || lower.contains("approval")
        || (is_error && lower.contains("deny"))
}

fn unit_kind_for_tool(name: &str) -> UnitKind {
    match name {
        TOOL_WRITE | TOOL_EDIT => UnitKind::WriteEdit,
        TOOL_TASK => UnitKind::Subagent,
        TOOL_ASK_USER_QUESTION => UnitKind::AskUserQuestion,
        _ => UnitKind::ToolCall,
    }
}

/// Maps one chunk to one fresh rendered unit.
///
/// `ToolResult` and `Done` return `None`: results mutate an existing unit (or
/// become a standalone unit via [`standalone_result_unit`]) and the terminal
/// marker renders nothing — both are owned by the transcript context.
pub fn render_chunk(chunk: &Chunk) -> Option<RenderedUnit> {
    match chunk {
        Chunk::Text { content } => {
            if is_interrupt_signal_text(content) {
                Some(RenderedUnit::new(UnitKind::Signal, content.trim()))
            } else {
                Some(RenderedUnit::text(content.clone()))
            }
        }
        Chunk::ToolUse { name, input, .. } => {
            let unit = RenderedUnit::new(unit_kind_for_tool(name), tool_label(name, input))
                .with_status(UnitStatus::Running);
            let summary = tool_summary(name, input);
            if summary.is_empty() {
                Some(unit)
            } else {
                Some(unit.with_detail(summary))
            }
        }
        Chunk::Blocked { content } => {
            Some(RenderedUnit::new(UnitKind::Blocked, content.clone()).with_status(UnitStatus::Blocked))
        }
        Chunk::Error { content } => {
            Some(RenderedUnit::new(UnitKind::Error, content.clone()).with_status(UnitStatus::Error))
        }
        Chunk::ToolResult { .. } | Chunk::Done => None,
    }
}

/// Applies a correlated result to the invocation's unit in place:
/// running -> completed / error / blocked.
pub fn apply_tool_result(unit: &mut RenderedUnit, content: &str, is_error: bool) {
    unit.status = if is_blocked_tool_result(content, is_error) {
        UnitStatus::Blocked
    } else if is_error {
        UnitStatus::Error
    } else {
        UnitStatus::Completed
    };
    unit.detail = Some(content.to_string());
}

/// Renders a result with no prior invocation as its own unit
/// (background/async subagent output).
pub fn standalone_result_unit(content: &str, is_error: bool) -> RenderedUnit {
    let caption = content
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(|line| truncate_text(line.trim(), 60))
        .unwrap_or_else(|| "result".to_string());
    let status = if is_error {
        UnitStatus::Error
    } else {
        UnitStatus::Completed
    };
    RenderedUnit::new(UnitKind::ToolResult, caption)
        .with_detail(content)
        .with_status(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn todo_write_renders_progress_counts() {
        let input = json!({"todos": [
            {"status": "completed"},
            {"status": "in_progress"},
            {"status": "pending"},
        ]});
        assert_eq!(tool_display_name(TOOL_TODO_WRITE, &input), "Tasks 1/3");
        assert_eq!(tool_label(TOOL_TODO_WRITE, &input), "Tasks (1/3)");
        assert_eq!(tool_display_name(TOOL_TODO_WRITE, &json!({})), "Tasks");
    }

    #[test]
    fn file_tools_summarize_to_the_file_name() {
        let input = json!({"file_path": "/home/user/vault/daily/2026-08-08.md"});
        assert_eq!(tool_summary(TOOL_READ, &input), "2026-08-08.md");
        assert_eq!(tool_label(TOOL_EDIT, &input), "Edit: .../daily/2026-08-08.md");
    }

    #[test]
    fn bash_summary_truncates_long_commands() {
        let long = "x".repeat(80);
        let input = json!({"command": long});
        let summary = tool_summary(TOOL_BASH, &input);
        assert_eq!(summary.chars().count(), 63);
        assert!(summary.ends_with("..."));
        assert!(tool_label(TOOL_BASH, &input).starts_with("Bash: "));
    }

    #[test]
    fn short_paths_stay_whole_in_labels() {
        let input = json!({"file_path": "notes/todo.md"});
        assert_eq!(tool_label(TOOL_READ, &input), "Read: notes/todo.md");
    }

    #[test]
    fn blocked_result_heuristics() {
        assert!(is_blocked_tool_result("Command blocked by blocklist", false));
        assert!(is_blocked_tool_result("Path is outside the vault", false));
        assert!(is_blocked_tool_result("User denied the request", false));
        assert!(is_blocked_tool_result("permission deny", true));
        assert!(!is_blocked_tool_result("permission deny", false));
        assert!(!is_blocked_tool_result("all good", false));
    }

    #[test]
    fn tool_use_chunks_render_by_kind() {
        let chunk = Chunk::tool_use("t1", TOOL_EDIT, json!({"file_path": "a.md"}));
        let unit = render_chunk(&chunk).expect("unit");
        assert_eq!(unit.kind, UnitKind::WriteEdit);
        assert_eq!(unit.status, UnitStatus::Running);

        let chunk = Chunk::tool_use("t2", TOOL_TASK, json!({}));
        assert_eq!(render_chunk(&chunk).expect("unit").kind, UnitKind::Subagent);

        let chunk = Chunk::tool_use("t3", TOOL_ASK_USER_QUESTION, json!({}));
        assert_eq!(
            render_chunk(&chunk).expect("unit").kind,
            UnitKind::AskUserQuestion
        );
    }

    #[test]
    fn interrupt_sentinel_text_renders_as_signal() {
        let chunk = Chunk::text("  [Request interrupted by user]  ");
        let unit = render_chunk(&chunk).expect("unit");
        assert_eq!(unit.kind, UnitKind::Signal);
        assert_eq!(unit.caption, "[Request interrupted by user]");

        let chunk = Chunk::text("plain prose");
        assert_eq!(render_chunk(&chunk).expect("unit").kind, UnitKind::Text);
    }

    #[test]
    fn results_and_done_render_nothing_directly() {
        assert!(render_chunk(&Chunk::tool_result("t1", "out", false)).is_none());
        assert!(render_chunk(&Chunk::Done).is_none());
    }

    #[test]
    fn apply_tool_result_transitions_status() {
        let mut unit = RenderedUnit::new(UnitKind::ToolCall, "Bash: ls")
            .with_status(UnitStatus::Running);
        apply_tool_result(&mut unit, "file1\nfile2", false);
        assert_eq!(unit.status, UnitStatus::Completed);
        assert_eq!(unit.detail.as_deref(), Some("file1\nfile2"));

        apply_tool_result(&mut unit, "exit 1", true);
        assert_eq!(unit.status, UnitStatus::Error);

        apply_tool_result(&mut unit, "Command blocked by blocklist", true);
        assert_eq!(unit.status, UnitStatus::Blocked);
    }

    #[test]
    fn standalone_results_caption_from_first_line() {
        let unit = standalone_result_unit("\nSubagent finished\ndetails here", false);
        assert_eq!(unit.kind, UnitKind::ToolResult);
        assert_eq!(unit.caption, "Subagent finished");
        assert_eq!(unit.status, UnitStatus::Completed);
    }
}
