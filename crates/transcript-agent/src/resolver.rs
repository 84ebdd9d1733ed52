use std::path::{Path, PathBuf};

/// Binary name probed in the conventional install locations.
pub const AGENT_CLI_NAME: &str = "claude";

/// Locates the agent CLI by checking common installation locations, in
/// order. The service memoizes the result; a miss is terminal for the query.
pub fn find_agent_cli() -> Option<PathBuf> {
    candidate_paths(home_dir().as_deref())
        .into_iter()
        .find(|candidate| candidate.is_file())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

fn candidate_paths(home: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(home) = home {
        candidates.push(home.join(".claude").join("local").join(AGENT_CLI_NAME));
        candidates.push(home.join(".local").join("bin").join(AGENT_CLI_NAME));
    }
    candidates.push(PathBuf::from("/usr/local/bin").join(AGENT_CLI_NAME));
    candidates.push(PathBuf::from("/opt/homebrew/bin").join(AGENT_CLI_NAME));
    if let Some(home) = home {
        candidates.push(home.join("bin").join(AGENT_CLI_NAME));
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_prefer_user_installs_over_system_paths() {
        let home = PathBuf::from("/home/tester");
        let candidates = candidate_paths(Some(&home));
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/home/tester/.claude/local/claude"),
                PathBuf::from("/home/tester/.local/bin/claude"),
                PathBuf::from("/usr/local/bin/claude"),
                PathBuf::from("/opt/homebrew/bin/claude"),
                PathBuf::from("/home/tester/bin/claude"),
            ]
        );
    }

    #[test]
    fn without_a_home_dir_only_system_paths_remain() {
        let candidates = candidate_paths(None);
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/usr/local/bin/claude"),
                PathBuf::from("/opt/homebrew/bin/claude"),
            ]
        );
    }

    #[test]
    fn find_resolves_a_real_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(AGENT_CLI_NAME);
        std::fs::write(&path, "#!/bin/sh\n").expect("write stub");
        // Exercise the probe logic directly against a known-existing file.
        let found = [path.clone()].into_iter().find(|p| p.is_file());
        assert_eq!(found, Some(path));
    }
}
