//! Shared types for a single tool invocation.
//!
//! Nothing here touches the filesystem or spawns processes.

use std::path::PathBuf;

/// Captured outcome of one external process run.
///
/// Produced once per invocation and consumed immediately to build a
/// response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    /// `None` when the process was killed by a signal or timed out.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    /// Bytes discarded beyond the capture limit.
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
}

/// Decides which exit codes count as a failed tool run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Any nonzero exit code fails.
    #[default]
    NonZero,
    /// Exit codes `>= code` fail. `ruff` exits 1 when it reports issues and
    /// 2 when it could not run, so it uses `AtLeast { code: 2 }`.
    AtLeast { code: i32 },
}

impl FailurePolicy {
    /// A missing exit code is always a failure.
    pub fn is_failure(self, exit_code: Option<i32>) -> bool {
        match (self, exit_code) {
            (_, None) => true,
            (Self::NonZero, Some(code)) => code != 0,
            (Self::AtLeast { code: threshold }, Some(code)) => code >= threshold,
        }
    }
}

/// A request to run one tool from the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCall {
    pub tool: String,
    /// Free arguments appended after the tool's fixed arguments.
    pub args: Vec<String>,
    /// Optional single file to scope the run to.
    pub file: Option<PathBuf>,
    /// Number of trailing stdout lines to return. Falls back to the tool's
    /// default, then to the full output.
    pub tail: Option<usize>,
}

impl ToolCall {
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            ..Self::default()
        }
    }

    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// An empty path means "no file", matching how agents often pass `""`.
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        let file = file.into();
        self.file = if file.as_os_str().is_empty() {
            None
        } else {
            Some(file)
        };
        self
    }

    pub fn with_tail(mut self, tail: usize) -> Self {
        self.tail = Some(tail);
        self
    }
}
