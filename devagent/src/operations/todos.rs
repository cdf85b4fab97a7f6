use anyhow::Result;
use tracing::{debug, info, instrument};

use super::{OperationExecutor, Toolbox};
use crate::core::arguments::ResolvedArguments;
use crate::core::catalog::Operation;
use crate::core::todos::{TodoLine, render_batch, todo_lines};
use crate::core::types::{ExecutionResult, Payload};

/// Summarize every TODO line across tracked files in one model call.
pub struct SummarizeTodos;

impl OperationExecutor for SummarizeTodos {
    fn operation(&self) -> Operation {
        Operation::SummarizeTodos
    }

    #[instrument(skip_all, fields(op = "summarize_todos"))]
    fn execute(&self, tools: &Toolbox<'_>, _args: &ResolvedArguments) -> Result<ExecutionResult> {
        let lines = collect_todos(tools)?;
        info!(count = lines.len(), "collected TODO lines");
        let batch = render_batch(&lines);
        let text = tools.generate(tools.prompts.summarize_todos(&batch)?)?;
        Ok(ExecutionResult::ok(
            self.operation().name(),
            Payload::Text { text },
        ))
    }
}

fn collect_todos(tools: &Toolbox<'_>) -> Result<Vec<TodoLine>> {
    let mut lines = Vec::new();
    for path in tools.vcs.list_tracked_files()? {
        match tools.vcs.read_file(&path)? {
            Some(contents) => lines.extend(todo_lines(&path, &contents)),
            None => debug!(path = %path, "skipping unreadable file"),
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::arguments::RawArguments;
    use crate::operations::resolve_arguments;
    use crate::test_support::Harness;

    fn args() -> ResolvedArguments {
        resolve_arguments(Operation::SummarizeTodos, RawArguments::new()).expect("resolve")
    }

    #[test]
    fn batches_todo_lines_in_tracked_file_order() {
        let mut harness = Harness::new();
        harness.vcs.files = vec![
            (
                "src/main.rs".to_string(),
                Some("fn main() {\n    // TODO: parse args\n}\n".to_string()),
            ),
            ("logo.png".to_string(), None),
            (
                "README.md".to_string(),
                Some("# widgets\nTODO: write docs\n".to_string()),
            ),
        ];
        harness.model.push_text("Two open items.");

        let result = SummarizeTodos
            .execute(&harness.toolbox(), &args())
            .expect("execute");

        assert_eq!(
            result.payload,
            Payload::Text {
                text: "Two open items.".to_string()
            }
        );
        let prompt = &harness.model.requests()[0].messages[0].content;
        assert!(prompt.contains("src/main.rs:2:    // TODO: parse args\nREADME.md:2:TODO: write docs"));
    }

    #[test]
    fn empty_batch_still_asks_the_model() {
        let mut harness = Harness::new();
        harness.vcs.files = vec![("a.rs".to_string(), Some("fn a() {}\n".to_string()))];
        harness.model.push_text("Nothing outstanding.");

        let result = SummarizeTodos
            .execute(&harness.toolbox(), &args())
            .expect("execute");

        assert!(result.success);
        let prompt = &harness.model.requests()[0].messages[0].content;
        assert!(!prompt.contains("a.rs"));
    }
}
