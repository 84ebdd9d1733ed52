use once_cell::sync::Lazy;
use regex::Regex;

const INTERRUPT_MARKERS: [&str; 2] = [
    "[Request interrupted by user]",
    "[Request interrupted by user for tool use]",
];

// Must match the entire trimmed string; a diagnostic quoted inside a larger
// payload is ordinary content, not a control signal.
static COMPACTION_CANCELED_STDERR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^<local-command-stderr>\s*Error:\s*Compaction canceled\.?\s*</local-command-stderr>$",
    )
    .expect("static pattern")
});

/// Returns true when the trimmed text is exactly one of the canonical
/// user-interrupt markers.
pub fn is_bracket_interrupt_text(text: &str) -> bool {
    let trimmed = text.trim();
    INTERRUPT_MARKERS.iter().any(|marker| *marker == trimmed)
}

/// Returns true when the trimmed text is exactly the canceled-compaction
/// stderr diagnostic.
pub fn is_compaction_canceled_stderr(text: &str) -> bool {
    COMPACTION_CANCELED_STDERR.is_match(text.trim())
}

/// Returns true when the text is a control signal disguised as content.
///
/// Downstream consumers use this to suppress or specially style a chunk that
/// is semantically an interrupt rather than assistant output.
pub fn is_interrupt_signal_text(text: &str) -> bool {
    is_bracket_interrupt_text(text) || is_compaction_canceled_stderr(text)
}
