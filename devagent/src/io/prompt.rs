//! Prompt rendering for the model-facing steps.
//!
//! Each generative step has a minijinja template under `prompts/`. Large
//! inputs (diffs, logs, TODO lists) are cut to a byte budget before rendering.

use std::borrow::Cow;

use anyhow::Result;
use minijinja::{Environment, context};
use tracing::debug;

use crate::io::llm::ChatMessage;

const DISPATCH_TEMPLATE: &str = include_str!("prompts/dispatch.md");
const COMMIT_MESSAGE_TEMPLATE: &str = include_str!("prompts/commit_message.md");
const PULL_REQUEST_TEMPLATE: &str = include_str!("prompts/pull_request.md");
const EXPLAIN_CHANGES_TEMPLATE: &str = include_str!("prompts/explain_changes.md");
const REVIEW_COMMENTS_TEMPLATE: &str = include_str!("prompts/review_comments.md");
const SUMMARIZE_TODOS_TEMPLATE: &str = include_str!("prompts/summarize_todos.md");
const RELEASE_NOTES_TEMPLATE: &str = include_str!("prompts/release_notes.md");
const ISSUE_FROM_LOG_TEMPLATE: &str = include_str!("prompts/issue_from_log.md");

const REVIEWER_SYSTEM: &str = "You are a helpful code reviewer.";
const RELEASE_WRITER_SYSTEM: &str = "You are an expert software release note writer.";
const ISSUE_WRITER_SYSTEM: &str = "You write GitHub issues from error logs.";

/// A rendered prompt: optional system message plus the user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: Option<String>,
    pub user: String,
}

impl Prompt {
    pub fn into_messages(self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.system {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(self.user));
        messages
    }
}

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
    input_limit_bytes: usize,
}

impl PromptEngine {
    pub fn new(input_limit_bytes: usize) -> Self {
        let mut env = Environment::new();
        for (name, source) in [
            ("dispatch", DISPATCH_TEMPLATE),
            ("commit_message", COMMIT_MESSAGE_TEMPLATE),
            ("pull_request", PULL_REQUEST_TEMPLATE),
            ("explain_changes", EXPLAIN_CHANGES_TEMPLATE),
            ("review_comments", REVIEW_COMMENTS_TEMPLATE),
            ("summarize_todos", SUMMARIZE_TODOS_TEMPLATE),
            ("release_notes", RELEASE_NOTES_TEMPLATE),
            ("issue_from_log", ISSUE_FROM_LOG_TEMPLATE),
        ] {
            env.add_template(name, source)
                .expect("bundled prompt template should be valid");
        }
        Self {
            env,
            input_limit_bytes,
        }
    }

    /// System prompt for the tool-selection call.
    pub fn dispatch_system(&self, repo: Option<&str>) -> Result<String> {
        self.render("dispatch", context! { repo => repo })
    }

    pub fn commit_message(&self, diff: &str) -> Result<Prompt> {
        let user = self.render(
            "commit_message",
            context! { diff => self.bounded("diff", diff) },
        )?;
        Ok(Prompt { system: None, user })
    }

    pub fn pull_request(&self, diff: &str, base: &str, head: &str) -> Result<Prompt> {
        let user = self.render(
            "pull_request",
            context! { diff => self.bounded("diff", diff), base => base, head => head },
        )?;
        Ok(Prompt { system: None, user })
    }

    pub fn explain_changes(&self, diff: &str) -> Result<Prompt> {
        let user = self.render(
            "explain_changes",
            context! { diff => self.bounded("diff", diff) },
        )?;
        Ok(Prompt { system: None, user })
    }

    pub fn review_comments(&self, diff: &str) -> Result<Prompt> {
        let user = self.render(
            "review_comments",
            context! { diff => self.bounded("diff", diff) },
        )?;
        Ok(Prompt {
            system: Some(REVIEWER_SYSTEM.to_string()),
            user,
        })
    }

    pub fn summarize_todos(&self, todos: &str) -> Result<Prompt> {
        let user = self.render(
            "summarize_todos",
            context! { todos => self.bounded("todos", todos) },
        )?;
        Ok(Prompt { system: None, user })
    }

    pub fn release_notes(&self, log: &str, base_ref: &str, head_ref: &str) -> Result<Prompt> {
        let user = self.render(
            "release_notes",
            context! {
                log => self.bounded("log", log),
                base_ref => base_ref,
                head_ref => head_ref,
            },
        )?;
        Ok(Prompt {
            system: Some(RELEASE_WRITER_SYSTEM.to_string()),
            user,
        })
    }

    pub fn issue_from_log(&self, log: &str) -> Result<Prompt> {
        let user = self.render(
            "issue_from_log",
            context! { log => self.bounded("log", log) },
        )?;
        Ok(Prompt {
            system: Some(ISSUE_WRITER_SYSTEM.to_string()),
            user,
        })
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String> {
        let template = self.env.get_template(name)?;
        Ok(template.render(ctx)?)
    }

    fn bounded<'a>(&self, label: &str, input: &'a str) -> Cow<'a, str> {
        let bounded = truncate_input(input, self.input_limit_bytes);
        if let Cow::Owned(_) = bounded {
            debug!(
                input = label,
                before_len = input.len(),
                limit = self.input_limit_bytes,
                "truncated prompt input"
            );
        }
        bounded
    }
}

/// Cut `input` to at most `limit` bytes on a char boundary, noting the cut.
pub fn truncate_input(input: &str, limit: usize) -> Cow<'_, str> {
    if input.len() <= limit {
        return Cow::Borrowed(input);
    }
    let mut end = limit;
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    Cow::Owned(format!(
        "{}\n[truncated {} bytes]",
        &input[..end],
        input.len() - end
    ))
}
