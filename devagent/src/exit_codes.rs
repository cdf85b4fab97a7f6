//! Stable exit codes for devagent CLI commands.

/// Every result succeeded (or the command has no results).
pub const OK: i32 = 0;
/// Invalid configuration, missing credentials, or a collaborator error that
/// escaped a direct invocation.
pub const INVALID: i32 = 1;
/// At least one operation reported a failed result.
pub const FAILED: i32 = 2;
