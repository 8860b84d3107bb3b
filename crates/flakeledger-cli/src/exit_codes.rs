//! Process exit codes. Part of the CLI contract for CI pipelines.

pub const OK: i32 = 0;
/// At least one non-skipped quality gate rule failed.
pub const GATE_FAILED: i32 = 1;
/// Bad arguments, unreadable config, malformed input, or a failed write.
pub const CONFIG_ERROR: i32 = 2;
