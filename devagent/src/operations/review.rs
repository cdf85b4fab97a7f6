use anyhow::Result;
use tracing::instrument;

use super::{OperationExecutor, Toolbox};
use crate::core::arguments::ResolvedArguments;
use crate::core::catalog::Operation;
use crate::core::types::{ExecutionResult, Payload};

/// Reviewer-style comments on the working-tree diff.
pub struct SuggestReviewComments;

impl OperationExecutor for SuggestReviewComments {
    fn operation(&self) -> Operation {
        Operation::SuggestReviewComments
    }

    #[instrument(skip_all, fields(op = "suggest_review_comments"))]
    fn execute(&self, tools: &Toolbox<'_>, _args: &ResolvedArguments) -> Result<ExecutionResult> {
        let diff = tools.vcs.diff(None)?;
        let text = tools.generate(tools.prompts.review_comments(&diff)?)?;
        Ok(ExecutionResult::ok(
            self.operation().name(),
            Payload::Text { text },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::arguments::RawArguments;
    use crate::io::llm::Role;
    use crate::operations::resolve_arguments;
    use crate::test_support::Harness;

    #[test]
    fn review_uses_reviewer_persona() {
        let harness = Harness::new();
        harness.model.push_text("- Consider documenting `added`.");
        let args = resolve_arguments(Operation::SuggestReviewComments, RawArguments::new())
            .expect("resolve");

        let result = SuggestReviewComments
            .execute(&harness.toolbox(), &args)
            .expect("execute");

        assert!(result.success);
        let request = &harness.model.requests()[0];
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[0].content, "You are a helpful code reviewer.");
        assert!(request.messages[1].content.contains("+pub fn added() {}"));
    }
}
