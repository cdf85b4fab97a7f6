use anyhow::Result;
use tracing::{debug, instrument};

use super::{OperationExecutor, Toolbox};
use crate::core::arguments::ResolvedArguments;
use crate::core::catalog::Operation;
use crate::core::types::{ExecutionResult, Payload};

const DEFAULT_BASE_REF: &str = "origin/main";
const DEFAULT_HEAD_REF: &str = "HEAD";
/// Commit subjects only.
const LOG_FORMAT: &str = "%s";

/// Release notes from commit subjects between two refs.
pub struct GenerateReleaseNotes;

impl OperationExecutor for GenerateReleaseNotes {
    fn operation(&self) -> Operation {
        Operation::GenerateReleaseNotes
    }

    fn defaults(&self) -> &'static [(&'static str, &'static str)] {
        &[("base_ref", DEFAULT_BASE_REF), ("head_ref", DEFAULT_HEAD_REF)]
    }

    #[instrument(skip_all, fields(op = "generate_release_notes"))]
    fn execute(&self, tools: &Toolbox<'_>, args: &ResolvedArguments) -> Result<ExecutionResult> {
        let base_ref = args.get("base_ref").unwrap_or(DEFAULT_BASE_REF);
        let head_ref = args.get("head_ref").unwrap_or(DEFAULT_HEAD_REF);
        let log = tools
            .vcs
            .log(&format!("{base_ref}..{head_ref}"), LOG_FORMAT)?;
        debug!(commits = log.lines().count(), "collected commit subjects");
        let prompt = tools.prompts.release_notes(&log, base_ref, head_ref)?;
        let text = tools.generate(prompt)?;
        Ok(ExecutionResult::ok(
            self.operation().name(),
            Payload::Text { text },
        ))
    }
}
