//! Sandboxed command runner for agent tools.
//!
//! An agent framework hands its agents a few callable tools: a dependency
//! manager, a test runner, a linter and its autofixer, plus file access.
//! This crate runs those tools against a single project directory:
//!
//! - **[`core`]**: Pure logic (path containment, output tails, failure
//!   policies). No I/O.
//! - **[`io`]**: The sandbox, config, file tools and child processes.
//! - **[`catalog`]** and **[`runner`]**: Named tool definitions and the
//!   runner that validates a call, spawns one process and shapes the result.
//!
//! Errors are [`error::ToolError`] values with a machine-readable
//! [`error::ErrorKind`]; the `Error: ...` string agents see is only a
//! rendering.

pub mod catalog;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod runner;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
