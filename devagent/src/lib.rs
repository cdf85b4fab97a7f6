//! Natural-language developer assistant for git repositories.
//!
//! An instruction is sent to a language model together with a fixed catalog of
//! repository operations (commit and push, open a pull request, explain or
//! review the diff, summarize TODOs, write release notes). The model's tool
//! calls are validated and executed in order. Every operation can also be run
//! directly, without the selection step.
//!
//! - **[`core`]**: Pure logic (catalog, argument validation, text extraction).
//!   No I/O.
//! - **[`io`]**: Collaborators with side effects (git, model API, GitHub API,
//!   configuration). Each sits behind a trait so tests can substitute fakes.
//! - **[`operations`]** and **[`dispatch`]**: Orchestration of the two.

pub mod core;
pub mod dispatch;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod operations;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
