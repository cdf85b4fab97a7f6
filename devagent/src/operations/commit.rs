use anyhow::Result;
use tracing::{debug, info, instrument};

use super::{OperationExecutor, Toolbox};
use crate::core::arguments::ResolvedArguments;
use crate::core::catalog::Operation;
use crate::core::types::{ExecutionResult, Payload};

const NOTHING_TO_COMMIT: &str = "nothing to commit after staging";

/// Stage everything, commit with a given or generated message, push.
pub struct CommitAndPush;

impl OperationExecutor for CommitAndPush {
    fn operation(&self) -> Operation {
        Operation::CommitAndPush
    }

    #[instrument(skip_all, fields(op = "commit_and_push_changes"))]
    fn execute(&self, tools: &Toolbox<'_>, args: &ResolvedArguments) -> Result<ExecutionResult> {
        let name = self.operation().name();
        let branch = tools.vcs.current_branch()?;

        // Staging first lets the message describe untracked and already-staged
        // work too. On a clean tree it changes nothing.
        tools.vcs.stage_all()?;
        let message = match args.non_blank("commit_message") {
            Some(message) => message.trim().to_string(),
            None => {
                let diff = tools.vcs.staged_diff()?;
                if diff.trim().is_empty() {
                    return Ok(ExecutionResult::failed(
                        name,
                        NOTHING_TO_COMMIT,
                        Payload::Empty,
                    ));
                }
                let prompt = tools.prompts.commit_message(&diff)?;
                let generated = tools.generate(prompt)?;
                if generated.is_empty() {
                    return Ok(ExecutionResult::failed(
                        name,
                        "model returned an empty commit message",
                        Payload::Empty,
                    ));
                }
                debug!(len = generated.len(), "generated commit message");
                generated
            }
        };

        if !tools.vcs.commit(&message)? {
            return Ok(ExecutionResult::failed(
                name,
                NOTHING_TO_COMMIT,
                Payload::Empty,
            ));
        }
        tools.vcs.push()?;
        let commit = tools.vcs.head_short_sha()?;
        info!(branch = %branch, commit = %commit, "committed and pushed");

        Ok(ExecutionResult::ok(
            name,
            Payload::Commit {
                message,
                branch,
                commit,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::resolve_arguments;
    use crate::test_support::Harness;

    fn args(message: Option<&str>) -> ResolvedArguments {
        let mut raw = crate::core::arguments::RawArguments::new();
        if let Some(message) = message {
            raw.insert("commit_message".to_string(), message.to_string());
        }
        resolve_arguments(Operation::CommitAndPush, raw).expect("resolve")
    }

    #[test]
    fn stages_then_describes_staged_changes_commits_and_pushes() {
        let harness = Harness::new();
        harness.model.push_text("  Add helper function\n");

        let result = CommitAndPush
            .execute(&harness.toolbox(), &args(None))
            .expect("execute");

        assert!(result.success);
        assert_eq!(
            result.payload,
            Payload::Commit {
                message: "Add helper function".to_string(),
                branch: "feature".to_string(),
                commit: "abc1234".to_string(),
            }
        );
        assert_eq!(
            harness
                .journal
                .filtered(&["git diff", "model", "git add", "git commit", "git push"]),
            vec![
                "git add -A",
                "git diff --cached",
                "model",
                "git commit Add helper function",
                "git push",
            ]
        );
        let request = &harness.model.requests()[0];
        assert!(request.tools.is_empty());
        assert!(request.messages[0].content.contains("+pub fn fresh() {}"));
    }

    #[test]
    fn provided_message_skips_the_model() {
        let harness = Harness::new();

        let result = CommitAndPush
            .execute(&harness.toolbox(), &args(Some("Fix typo")))
            .expect("execute");

        assert!(result.success);
        assert!(harness.model.requests().is_empty());
        assert!(!harness.journal.contains("git diff --cached"));
        assert!(harness.journal.contains("git commit Fix typo"));
    }

    #[test]
    fn clean_tree_without_message_commits_nothing() {
        let mut harness = Harness::new();
        harness.vcs.staged_diff = String::new();

        let result = CommitAndPush
            .execute(&harness.toolbox(), &args(None))
            .expect("execute");

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(NOTHING_TO_COMMIT));
        assert!(harness.model.requests().is_empty());
        assert!(harness.journal.filtered(&["git commit", "git push"]).is_empty());
    }

    #[test]
    fn message_is_drawn_from_staged_diff_not_working_diff() {
        let mut harness = Harness::new();
        harness.vcs.working_diff = String::new();
        harness.model.push_text("Add fresh");

        let result = CommitAndPush
            .execute(&harness.toolbox(), &args(None))
            .expect("execute");

        assert!(result.success, "{result:?}");
        assert!(!harness.journal.contains("git diff"));
        assert!(harness.journal.contains("git commit Add fresh"));
    }

    #[test]
    fn nothing_staged_stops_before_push() {
        let mut harness = Harness::new();
        harness.vcs.has_changes = false;

        let result = CommitAndPush
            .execute(&harness.toolbox(), &args(Some("Tidy")))
            .expect("execute");

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(NOTHING_TO_COMMIT));
        assert!(!harness.journal.contains("git push"));
    }

    #[test]
    fn push_failure_propagates() {
        let mut harness = Harness::new();
        harness.vcs.push_error = Some("rejected: non-fast-forward".to_string());

        let err = CommitAndPush
            .execute(&harness.toolbox(), &args(Some("Tidy")))
            .unwrap_err();

        assert!(err.to_string().contains("non-fast-forward"));
    }
}
