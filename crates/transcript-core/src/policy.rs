use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Blocklist entries shipped by default.
pub const DEFAULT_BLOCKED_COMMANDS: &[&str] = &[
    "rm -rf",
    "rm -r /",
    "chmod 777",
    "chmod -R 777",
    "mkfs",
    "dd if=",
    "> /dev/sd",
];

/// Configuration for the shell-command blocklist.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Master switch; a disabled policy never blocks.
    #[serde(default = "default_enable_blocklist")]
    pub enable_blocklist: bool,
    /// Patterns evaluated in order; first match wins.
    #[serde(default = "default_blocked_commands")]
    pub blocked_commands: Vec<String>,
}

const fn default_enable_blocklist() -> bool {
    true
}

fn default_blocked_commands() -> Vec<String> {
    DEFAULT_BLOCKED_COMMANDS
        .iter()
        .map(|entry| (*entry).to_string())
        .collect()
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            enable_blocklist: default_enable_blocklist(),
            blocked_commands: default_blocked_commands(),
        }
    }
}

#[derive(Clone, Debug)]
enum Matcher {
    Pattern(regex::Regex),
    Substring(String),
}

/// Decides whether a requested shell invocation is presented as blocked.
///
/// Each configured pattern compiles to a case-insensitive regex; a pattern
/// that fails to compile degrades to a case-insensitive substring test
/// instead of failing the whole check. A positive decision substitutes a
/// [`Chunk::Blocked`](crate::Chunk) for the invocation in the UI-facing
/// sequence only — nothing here stops the upstream service from executing
/// the command, so this must not be treated as a security boundary.
#[derive(Clone, Debug)]
pub struct CommandPolicy {
    enabled: bool,
    matchers: Vec<Matcher>,
}

impl CommandPolicy {
    /// Compiles the configured patterns once.
    pub fn new(config: &PolicyConfig) -> Self {
        let matchers = config
            .blocked_commands
            .iter()
            .map(|pattern| {
                match RegexBuilder::new(pattern).case_insensitive(true).build() {
                    Ok(regex) => Matcher::Pattern(regex),
                    Err(_) => {
                        warn!(pattern = %pattern, "blocklist pattern is not a valid regex; using substring match");
                        Matcher::Substring(pattern.to_lowercase())
                    }
                }
            })
            .collect();
        Self {
            enabled: config.enable_blocklist,
            matchers,
        }
    }

    /// Returns true when the first matching pattern blocks `command`.
    pub fn is_blocked(&self, command: &str) -> bool {
        if !self.enabled {
            return false;
        }
        self.matchers.iter().any(|matcher| match matcher {
            Matcher::Pattern(regex) => regex.is_match(command),
            Matcher::Substring(needle) => command.to_lowercase().contains(needle),
        })
    }
}

impl Default for CommandPolicy {
    fn default() -> Self {
        Self::new(&PolicyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_blocks_destructive_commands() {
        let policy = CommandPolicy::default();
        assert!(policy.is_blocked("rm -rf /tmp/x"));
        assert!(policy.is_blocked("sudo chmod 777 /etc"));
        assert!(policy.is_blocked("dd if=/dev/zero of=/dev/sda"));
    }

    #[test]
    fn default_policy_passes_benign_commands() {
        let policy = CommandPolicy::default();
        assert!(!policy.is_blocked("ls -la"));
        assert!(!policy.is_blocked("cargo build"));
        assert!(!policy.is_blocked("rm notes.txt"));
    }

    #[test]
    fn disabled_policy_never_blocks() {
        let policy = CommandPolicy::new(&PolicyConfig {
            enable_blocklist: false,
            ..PolicyConfig::default()
        });
        assert!(!policy.is_blocked("rm -rf /"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let policy = CommandPolicy::new(&PolicyConfig {
            enable_blocklist: true,
            blocked_commands: vec!["RM -RF".into()],
        });
        assert!(policy.is_blocked("rm -rf /tmp"));
    }

    #[test]
    fn invalid_regex_degrades_to_substring_match() {
        let policy = CommandPolicy::new(&PolicyConfig {
            enable_blocklist: true,
            blocked_commands: vec!["[unclosed".into()],
        });
        assert!(policy.is_blocked("echo [UNCLOSED bracket"));
        assert!(!policy.is_blocked("echo fine"));
    }

    #[test]
    fn repeated_evaluation_is_stable() {
        let policy = CommandPolicy::default();
        let decisions: Vec<bool> = (0..4).map(|_| policy.is_blocked("rm -rf /tmp/x")).collect();
        assert_eq!(decisions, vec![true; 4]);
    }
}
