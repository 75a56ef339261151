use spectrum_core::executor::args;
use spectrum_core::naming::DEFAULT_BRANCH;
use spectrum_core::{CommandError, CommandExecutor};

/// Current branch of the working tree, or [`DEFAULT_BRANCH`] when `git branch`
/// marks none (a repository without commits).
pub async fn current_branch<E: CommandExecutor>(executor: &E) -> Result<String, GitError> {
    let output = executor
        .exec("git", &args(["branch"]), &[])
        .await
        .map_err(GitError::Branch)?;

    let branch = parse_current_branch(&output).unwrap_or(DEFAULT_BRANCH);
    tracing::debug!(branch, "resolved current branch");
    Ok(branch.to_owned())
}

/// Name on the line `git branch` marks with `*`.
pub fn parse_current_branch(output: &str) -> Option<&str> {
    output
        .lines()
        .find_map(|line| line.trim_start().strip_prefix('*'))
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("failed to read the current git branch")]
    Branch(#[source] CommandError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marked_line_wins() {
        let output = "  develop\n* feature/login\n  master\n";
        assert_eq!(parse_current_branch(output), Some("feature/login"));
    }

    #[test]
    fn no_marker_yields_none() {
        assert_eq!(parse_current_branch(""), None);
        assert_eq!(parse_current_branch("  master\n  develop\n"), None);
    }

    #[test]
    fn detached_head_is_reported_verbatim() {
        let output = "* (HEAD detached at 1a2b3c4)\n  master\n";
        assert_eq!(
            parse_current_branch(output),
            Some("(HEAD detached at 1a2b3c4)")
        );
    }
}
