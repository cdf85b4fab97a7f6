//! Executors, one per catalog operation.
//!
//! An executor orchestrates the collaborators in a [`Toolbox`] and, for
//! content-generating operations, makes one model call. Each executor owns its
//! default-argument policy through [`OperationExecutor::defaults`].

use anyhow::Result;

use crate::core::arguments::{DispatchError, RawArguments, ResolvedArguments, resolve};
use crate::core::catalog::Operation;
use crate::core::types::ExecutionResult;
use crate::io::config::Settings;
use crate::io::git::VersionControl;
use crate::io::github::RepositoryHost;
use crate::io::llm::LanguageModel;
use crate::io::prompt::{Prompt, PromptEngine};

pub mod commit;
pub mod explain;
pub mod issue;
pub mod pull_request;
pub mod release_notes;
pub mod review;
pub mod todos;

/// Collaborators and settings shared by every executor in one run.
#[derive(Clone, Copy)]
pub struct Toolbox<'a> {
    pub settings: &'a Settings,
    pub vcs: &'a dyn VersionControl,
    pub model: &'a dyn LanguageModel,
    pub host: &'a dyn RepositoryHost,
    pub prompts: &'a PromptEngine,
}

impl Toolbox<'_> {
    /// Run one tool-free model call for `prompt`.
    pub fn generate(&self, prompt: Prompt) -> Result<String> {
        self.model.generate(prompt.into_messages())
    }
}

pub trait OperationExecutor {
    fn operation(&self) -> Operation;

    /// Literal values for parameters the caller left out.
    fn defaults(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }

    fn execute(&self, tools: &Toolbox<'_>, args: &ResolvedArguments) -> Result<ExecutionResult>;
}

pub fn executor_for(op: Operation) -> &'static dyn OperationExecutor {
    match op {
        Operation::CommitAndPush => &commit::CommitAndPush,
        Operation::CreatePullRequest => &pull_request::CreatePullRequest,
        Operation::ExplainChanges => &explain::ExplainChanges,
        Operation::SuggestReviewComments => &review::SuggestReviewComments,
        Operation::SummarizeTodos => &todos::SummarizeTodos,
        Operation::GenerateReleaseNotes => &release_notes::GenerateReleaseNotes,
        Operation::CreateIssueFromLog => &issue::CreateIssueFromLog,
    }
}

/// Merge `raw` with the operation's executor defaults.
pub fn resolve_arguments(
    op: Operation,
    raw: RawArguments,
) -> Result<ResolvedArguments, DispatchError> {
    resolve(op.spec(), raw, executor_for(op).defaults())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executor_table_matches_operations() {
        for op in Operation::ALL {
            assert_eq!(executor_for(op).operation(), op);
        }
    }

    #[test]
    fn defaults_only_name_declared_parameters() {
        for op in Operation::ALL {
            for (name, _) in executor_for(op).defaults() {
                assert!(op.spec().parameter(name).is_some(), "{} / {name}", op.name());
            }
        }
    }

    #[test]
    fn release_notes_defaults_resolve() {
        let args = resolve_arguments(Operation::GenerateReleaseNotes, RawArguments::new())
            .expect("resolve");
        assert_eq!(args.get("base_ref"), Some("origin/main"));
        assert_eq!(args.get("head_ref"), Some("HEAD"));
    }

    #[test]
    fn pull_request_base_defaults_to_main() {
        let args =
            resolve_arguments(Operation::CreatePullRequest, RawArguments::new()).expect("resolve");
        assert_eq!(args.get("base"), Some("main"));
        assert_eq!(args.get("title"), None);
    }
}
