//! Deterministic, pure logic shared by the dispatcher and the executors.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! values (model text, argument payloads, file contents) and return
//! deterministic outputs suitable for tests.

pub mod arguments;
pub mod catalog;
pub mod extract;
pub mod repo_id;
pub mod todos;
pub mod types;
