//! The sandboxed command runner.
//!
//! [`ToolRunner::run`] validates a [`ToolCall`] against its [`ToolSpec`] and
//! the [`Sandbox`], spawns exactly one process, and turns the result into
//! output text or a [`ToolError`]. Validation failures never reach the
//! spawner.

use std::ffi::OsString;
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::catalog::{ToolCatalog, ToolSpec, validate_arguments};
use crate::core::tail::tail_lines;
use crate::core::types::ToolCall;
use crate::error::{ToolError, ToolResult};
use crate::io::process::{Invocation, ProcessSpawner, SystemSpawner};
use crate::io::sandbox::Sandbox;

pub struct ToolRunner<S = SystemSpawner> {
    sandbox: Sandbox,
    catalog: ToolCatalog,
    spawner: S,
}

/// Argument object accepted by [`ToolRunner::call`].
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CallArguments {
    args: Vec<String>,
    file: Option<PathBuf>,
    tail: Option<usize>,
}

impl<S: ProcessSpawner> ToolRunner<S> {
    pub fn new(sandbox: Sandbox, catalog: ToolCatalog, spawner: S) -> Self {
        Self {
            sandbox,
            catalog,
            spawner,
        }
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Run one tool call to completion.
    #[instrument(skip_all, fields(tool = %call.tool))]
    pub fn run(&self, call: &ToolCall) -> ToolResult {
        let spec = self.catalog.get(&call.tool)?;
        let invocation = self.prepare(spec, call)?;

        info!(command = %invocation.command_line(), "running tool command");
        let result = self.spawner.spawn(&invocation).map_err(|err| {
            warn!(err = %format!("{err:#}"), "failed to run tool command");
            ToolError::Launch {
                program: spec.program.clone(),
                message: format!("{err:#}"),
            }
        })?;
        debug!(
            exit_code = ?result.exit_code,
            stdout_bytes = result.stdout.len(),
            stderr_bytes = result.stderr.len(),
            "tool command finished"
        );

        if result.timed_out {
            return Err(ToolError::TimedOut {
                program: spec.program.clone(),
            });
        }
        if spec.failure_policy().is_failure(result.exit_code) {
            info!(exit_code = ?result.exit_code, "tool command failed");
            return Err(ToolError::Failed {
                exit_code: result.exit_code,
                stderr: result.stderr,
            });
        }

        Ok(match call.tail.or(spec.tail) {
            Some(tail) => tail_lines(&result.stdout, tail),
            None => result.stdout,
        })
    }

    /// Run a tool from a JSON argument object, as an agent framework would.
    ///
    /// The object is checked against the tool's parameter schema first.
    pub fn call(&self, tool: &str, arguments: &Value) -> ToolResult {
        let spec = self.catalog.get(tool)?;
        validate_arguments(tool, spec, arguments)?;
        let parsed: CallArguments = serde_json::from_value(arguments.clone())
            .map_err(|err| ToolError::invalid_arguments(tool, err.to_string()))?;

        let mut call = ToolCall::new(tool).with_args(parsed.args);
        if let Some(file) = parsed.file {
            call = call.with_file(file);
        }
        call.tail = parsed.tail;
        self.run(&call)
    }

    fn prepare(&self, spec: &ToolSpec, call: &ToolCall) -> ToolResult<Invocation> {
        let mut args = call.args.as_slice();
        if spec.strip_program_prefix
            && let Some((first, rest)) = args.split_first()
            && spec.is_program_name(&call.tool, first)
        {
            args = rest;
        }
        if !args.is_empty() && !spec.accepts_args {
            return Err(ToolError::invalid_arguments(
                &call.tool,
                "this tool does not accept arguments",
            ));
        }

        let target = match &call.file {
            Some(_) if !spec.accepts_file => {
                return Err(ToolError::invalid_arguments(
                    &call.tool,
                    "this tool does not accept a target file",
                ));
            }
            Some(file) => Some(self.sandbox.resolve_existing(file)?),
            None => None,
        };

        let mut argv: Vec<OsString> = spec.args.iter().map(OsString::from).collect();
        argv.extend(args.iter().map(OsString::from));
        if let Some(target) = target {
            argv.push(target.into_os_string());
        }
        Ok(Invocation {
            program: spec.program.clone(),
            args: argv,
            workdir: self.sandbox.root().to_path_buf(),
        })
    }
}
