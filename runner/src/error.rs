//! Tool-facing error type.
//!
//! Every failure a tool call can hit is a [`ToolError`]. Callers branch on
//! [`ToolError::kind`]; agents get the `Error: ...` rendering.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

pub type ToolResult<T = String, E = ToolError> = Result<T, E>;

/// Machine-readable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AccessDenied,
    NotFound,
    UnknownTool,
    InvalidArguments,
    Launch,
    Failed,
    TimedOut,
    Io,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Access to this file is not allowed!")]
    AccessDenied { path: PathBuf },

    #[error("The target file does not exist!")]
    NotFound { path: PathBuf },

    #[error("unknown tool `{0}`")]
    UnknownTool(String),

    #[error("invalid arguments for `{tool}`: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("failed to launch `{program}`: {message}")]
    Launch { program: String, message: String },

    #[error("{}", failed_detail(.exit_code, .stderr))]
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("`{program}` timed out")]
    TimedOut { program: String },

    #[error("{0:#}")]
    Io(anyhow::Error),
}

impl ToolError {
    pub fn invalid_arguments(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    pub fn io(err: impl Into<anyhow::Error>) -> Self {
        Self::Io(err.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AccessDenied { .. } => ErrorKind::AccessDenied,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::UnknownTool(_) => ErrorKind::UnknownTool,
            Self::InvalidArguments { .. } => ErrorKind::InvalidArguments,
            Self::Launch { .. } => ErrorKind::Launch,
            Self::Failed { .. } => ErrorKind::Failed,
            Self::TimedOut { .. } => ErrorKind::TimedOut,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// The string handed back to an agent.
    pub fn render(&self) -> String {
        format!("Error: {self}")
    }
}

fn failed_detail(exit_code: &Option<i32>, stderr: &str) -> String {
    if !stderr.trim().is_empty() {
        return stderr.to_string();
    }
    match exit_code {
        Some(code) => format!("process exited with status {code}"),
        None => "process terminated by signal".to_string(),
    }
}

/// Serializable outcome of a tool call, for JSON consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolResponse {
    Ok { output: String },
    Error { kind: ErrorKind, detail: String },
}

impl ToolResponse {
    pub fn from_result(result: &ToolResult) -> Self {
        match result {
            Ok(output) => Self::Ok {
                output: output.clone(),
            },
            Err(err) => Self::Error {
                kind: err.kind(),
                detail: err.to_string(),
            },
        }
    }

    /// Plain-text rendering: the output itself, or `Error: <detail>`.
    pub fn render_text(&self) -> String {
        match self {
            Self::Ok { output } => output.clone(),
            Self::Error { detail, .. } => format!("Error: {detail}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_denied_renders_fixed_message() {
        let err = ToolError::AccessDenied {
            path: PathBuf::from("../outside.py"),
        };
        assert_eq!(err.render(), "Error: Access to this file is not allowed!");
        assert_eq!(err.kind(), ErrorKind::AccessDenied);
    }

    #[test]
    fn failed_renders_stderr() {
        let err = ToolError::Failed {
            exit_code: Some(2),
            stderr: "ruff failed: invalid config\n".to_string(),
        };
        assert_eq!(err.render(), "Error: ruff failed: invalid config\n");
    }

    #[test]
    fn failed_without_stderr_mentions_status() {
        let err = ToolError::Failed {
            exit_code: Some(1),
            stderr: "  \n".to_string(),
        };
        assert_eq!(err.render(), "Error: process exited with status 1");
    }

    #[test]
    fn response_serializes_with_status_tag() {
        let response = ToolResponse::from_result(&Err(ToolError::NotFound {
            path: PathBuf::from("missing.py"),
        }));
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["status"], "error");
        assert_eq!(json["kind"], "not_found");
        assert_eq!(json["detail"], "The target file does not exist!");

        let ok = ToolResponse::from_result(&Ok("done".to_string()));
        let json = serde_json::to_value(&ok).expect("serialize");
        assert_eq!(json["status"], "ok");
        assert_eq!(json["output"], "done");
    }
}
