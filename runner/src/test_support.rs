//! Test-only helpers: a scripted process spawner and a throwaway project.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tempfile::TempDir;

use crate::catalog::ToolCatalog;
use crate::core::types::ExecutionResult;
use crate::io::process::{Invocation, ProcessSpawner};
use crate::io::sandbox::Sandbox;
use crate::runner::ToolRunner;

/// Spawner that records every invocation and returns a fixed outcome.
pub struct ScriptedSpawner {
    outcome: Result<ExecutionResult, String>,
    calls: RefCell<Vec<Invocation>>,
}

impl ScriptedSpawner {
    /// `Err(message)` simulates a process that could not be launched.
    pub fn new(outcome: Result<ExecutionResult, String>) -> Self {
        Self {
            outcome,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn succeeding(stdout: &str) -> Self {
        Self::exiting(0, stdout, "")
    }

    pub fn exiting(code: i32, stdout: &str, stderr: &str) -> Self {
        Self::new(Ok(ExecutionResult {
            exit_code: Some(code),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            ..ExecutionResult::default()
        }))
    }

    pub fn failing_to_launch(message: &str) -> Self {
        Self::new(Err(message.to_string()))
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl ProcessSpawner for ScriptedSpawner {
    fn spawn(&self, invocation: &Invocation) -> Result<ExecutionResult> {
        self.calls.borrow_mut().push(invocation.clone());
        self.outcome.clone().map_err(|message| anyhow!(message))
    }
}

/// A `project/` directory inside a temp dir, so tests can also place files
/// next to (outside) the sandbox root.
pub struct TestProject {
    temp: TempDir,
    root: PathBuf,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create temp dir")?;
        let root = temp.path().join("project");
        fs::create_dir_all(&root).with_context(|| format!("create {}", root.display()))?;
        Ok(Self { temp, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a file under the project root, creating parents.
    pub fn write(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        write_with_parents(&self.root.join(relative), contents)?;
        self.root
            .join(relative)
            .canonicalize()
            .with_context(|| format!("resolve {relative}"))
    }

    /// Write a file next to the project root, outside the sandbox.
    pub fn write_outside(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        let path = self.temp.path().join(relative);
        write_with_parents(&path, contents)?;
        Ok(path)
    }

    pub fn sandbox(&self) -> Result<Sandbox> {
        Sandbox::new(&self.root)
    }

    /// Runner over the default catalog.
    pub fn runner<S: ProcessSpawner>(&self, spawner: S) -> Result<ToolRunner<S>> {
        Ok(ToolRunner::new(
            self.sandbox()?,
            ToolCatalog::default(),
            spawner,
        ))
    }
}

fn write_with_parents(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}
