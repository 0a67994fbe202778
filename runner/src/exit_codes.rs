//! Stable exit codes for toolrunner CLI commands.

use crate::error::ErrorKind;

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid config, usage, tool name, or tool arguments.
pub const INVALID: i32 = 1;
/// The tool could not be launched, exited with a failure code, or timed out.
pub const FAILED: i32 = 2;
/// The target path was outside the project root or did not exist.
pub const DENIED: i32 = 3;

pub fn for_error(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::AccessDenied | ErrorKind::NotFound => DENIED,
        ErrorKind::UnknownTool | ErrorKind::InvalidArguments => INVALID,
        ErrorKind::Launch | ErrorKind::Failed | ErrorKind::TimedOut | ErrorKind::Io => FAILED,
    }
}
