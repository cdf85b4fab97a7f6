use anyhow::Result;
use tracing::instrument;

use super::{OperationExecutor, Toolbox};
use crate::core::arguments::ResolvedArguments;
use crate::core::catalog::Operation;
use crate::core::types::{ExecutionResult, Payload};

/// Plain-language explanation of the working-tree diff.
pub struct ExplainChanges;

impl OperationExecutor for ExplainChanges {
    fn operation(&self) -> Operation {
        Operation::ExplainChanges
    }

    #[instrument(skip_all, fields(op = "explain_changes"))]
    fn execute(&self, tools: &Toolbox<'_>, _args: &ResolvedArguments) -> Result<ExecutionResult> {
        let diff = tools.vcs.diff(None)?;
        let text = tools.generate(tools.prompts.explain_changes(&diff)?)?;
        Ok(ExecutionResult::ok(
            self.operation().name(),
            Payload::Text { text },
        ))
    }
}
