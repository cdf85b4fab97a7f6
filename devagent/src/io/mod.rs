//! Side-effecting collaborators: git, the model API, the hosting API,
//! configuration and prompt rendering.

pub mod config;
pub mod git;
pub mod github;
pub mod llm;
pub mod process;
pub mod prompt;
