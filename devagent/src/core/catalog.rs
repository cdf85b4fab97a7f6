//! Static operation catalog.
//!
//! [`Operation`] is the closed set of actions the agent can perform. Every
//! mapping (name, spec, CLI selector, message parameter) is an exhaustive
//! match, so adding a variant fails to compile until each one is filled in.

use crate::core::types::{OperationSpec, ParameterSpec};

static COMMIT_AND_PUSH: OperationSpec = OperationSpec {
    name: "commit_and_push_changes",
    description: "Stage all changes, commit them and push the current branch. \
                  If no commit message is given, one is written from the current diff.",
    parameters: &[ParameterSpec::optional(
        "commit_message",
        "Commit message to use. Omit to generate one from the diff.",
    )],
};

static CREATE_PULL_REQUEST: OperationSpec = OperationSpec {
    name: "create_pull_request",
    description: "Open a GitHub pull request from the current branch. \
                  Missing title or body is written from the diff against the base branch.",
    parameters: &[
        ParameterSpec::optional("base", "Base branch to merge into. Defaults to main."),
        ParameterSpec::optional("title", "Pull request title."),
        ParameterSpec::optional("body", "Pull request description."),
    ],
};

static EXPLAIN_CHANGES: OperationSpec = OperationSpec {
    name: "explain_changes",
    description: "Explain the uncommitted changes in the working tree in plain language.",
    parameters: &[],
};

static SUGGEST_REVIEW_COMMENTS: OperationSpec = OperationSpec {
    name: "suggest_review_comments",
    description: "Act as a code reviewer and suggest inline review comments for the \
                  uncommitted changes.",
    parameters: &[],
};

static SUMMARIZE_TODOS: OperationSpec = OperationSpec {
    name: "summarize_todos",
    description: "Collect TODO comments across all tracked files and summarize and \
                  prioritize them.",
    parameters: &[],
};

static GENERATE_RELEASE_NOTES: OperationSpec = OperationSpec {
    name: "generate_release_notes",
    description: "Write markdown release notes from the commit subjects between two refs.",
    parameters: &[
        ParameterSpec::optional("base_ref", "Older ref. Defaults to origin/main."),
        ParameterSpec::optional("head_ref", "Newer ref. Defaults to HEAD."),
    ],
};

static CREATE_ISSUE_FROM_LOG: OperationSpec = OperationSpec {
    name: "create_github_issue_from_error_log",
    description: "File a GitHub issue (title, body, labels) written from an error log.",
    parameters: &[ParameterSpec::required(
        "error_log",
        "Raw error log to turn into an issue.",
    )],
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CommitAndPush,
    CreatePullRequest,
    ExplainChanges,
    SuggestReviewComments,
    SummarizeTodos,
    GenerateReleaseNotes,
    CreateIssueFromLog,
}

impl Operation {
    /// Every operation, in catalog order.
    pub const ALL: [Operation; 7] = [
        Operation::CommitAndPush,
        Operation::CreatePullRequest,
        Operation::ExplainChanges,
        Operation::SuggestReviewComments,
        Operation::SummarizeTodos,
        Operation::GenerateReleaseNotes,
        Operation::CreateIssueFromLog,
    ];

    pub fn spec(self) -> &'static OperationSpec {
        match self {
            Operation::CommitAndPush => &COMMIT_AND_PUSH,
            Operation::CreatePullRequest => &CREATE_PULL_REQUEST,
            Operation::ExplainChanges => &EXPLAIN_CHANGES,
            Operation::SuggestReviewComments => &SUGGEST_REVIEW_COMMENTS,
            Operation::SummarizeTodos => &SUMMARIZE_TODOS,
            Operation::GenerateReleaseNotes => &GENERATE_RELEASE_NOTES,
            Operation::CreateIssueFromLog => &CREATE_ISSUE_FROM_LOG,
        }
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Whether the model may select this operation on its own.
    ///
    /// Issue filing needs the error log verbatim, so it is only reachable
    /// through the direct path.
    pub fn is_model_selectable(self) -> bool {
        !matches!(self, Operation::CreateIssueFromLog)
    }

    /// Selector accepted by `devagent run`.
    pub fn cli_selector(self) -> &'static str {
        match self {
            Operation::CommitAndPush => "commit_and_push",
            Operation::CreatePullRequest => "create_pr",
            Operation::ExplainChanges => "explain_changes",
            Operation::SuggestReviewComments => "review_comments",
            Operation::SummarizeTodos => "summarize_todos",
            Operation::GenerateReleaseNotes => "release_notes",
            Operation::CreateIssueFromLog => "create_issue",
        }
    }

    pub fn from_cli_selector(selector: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.cli_selector() == selector)
    }

    /// Parameter that receives `--message` on the direct path, if any.
    pub fn message_parameter(self) -> Option<&'static str> {
        match self {
            Operation::CommitAndPush => Some("commit_message"),
            Operation::CreateIssueFromLog => Some("error_log"),
            Operation::CreatePullRequest
            | Operation::ExplainChanges
            | Operation::SuggestReviewComments
            | Operation::SummarizeTodos
            | Operation::GenerateReleaseNotes => None,
        }
    }
}

/// Operations advertised to the model for one dispatch cycle.
pub fn model_catalog() -> Vec<Operation> {
    Operation::ALL
        .into_iter()
        .filter(|op| op.is_model_selectable())
        .collect()
}

/// Resolve a model-requested name against the advertised catalog.
pub fn lookup_selectable(name: &str) -> Option<Operation> {
    Operation::from_name(name).filter(|op| op.is_model_selectable())
}
