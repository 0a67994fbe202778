//! Child process execution with bounded output capture.

use std::ffi::OsString;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

use crate::core::types::ExecutionResult;

pub const DEFAULT_OUTPUT_LIMIT_BYTES: usize = 1_000_000;

/// A fully resolved external command: program, argv and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<OsString>,
    pub workdir: PathBuf,
}

impl Invocation {
    /// Space-joined command line for logs.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

/// Launches an [`Invocation`] and waits for it.
///
/// Returns `Err` only when the process could not be started or observed;
/// a nonzero exit is a successful spawn.
pub trait ProcessSpawner {
    fn spawn(&self, invocation: &Invocation) -> Result<ExecutionResult>;
}

/// Spawner backed by `std::process::Command`.
#[derive(Debug, Clone)]
pub struct SystemSpawner {
    /// Kill the child after this long. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub output_limit_bytes: usize,
}

impl Default for SystemSpawner {
    fn default() -> Self {
        Self {
            timeout: None,
            output_limit_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
        }
    }
}

impl ProcessSpawner for SystemSpawner {
    fn spawn(&self, invocation: &Invocation) -> Result<ExecutionResult> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args).current_dir(&invocation.workdir);
        let output = run_command(cmd, self.timeout, self.output_limit_bytes)
            .with_context(|| format!("run {}", invocation.program))?;
        Ok(output.into_execution_result())
    }
}

/// Raw captured child output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn into_execution_result(self) -> ExecutionResult {
        ExecutionResult {
            exit_code: if self.timed_out {
                None
            } else {
                self.status.code()
            },
            stdout: String::from_utf8_lossy(&self.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&self.stderr).into_owned(),
            timed_out: self.timed_out,
            stdout_truncated: self.stdout_truncated,
            stderr_truncated: self.stderr_truncated,
        }
    }
}

/// Run a command to completion and capture stdout/stderr without risking pipe deadlocks.
///
/// Both pipes are drained on reader threads while the child runs. At most
/// `output_limit_bytes` of each stream is kept; the rest is read and counted.
/// stdin is always null.
#[instrument(skip_all, fields(timeout = ?timeout, output_limit_bytes = output_limit_bytes))]
pub fn run_command(
    mut cmd: Command,
    timeout: Option<Duration>,
    output_limit_bytes: usize,
) -> Result<CommandOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!("spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(e).context("spawn command");
        }
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let stdout_handle = thread::spawn(move || read_stream_limited(stdout, output_limit_bytes));
    let stderr_handle = thread::spawn(move || read_stream_limited(stderr, output_limit_bytes));

    let mut timed_out = false;
    let status = match timeout {
        None => child.wait().context("wait for command")?,
        Some(limit) => match child.wait_timeout(limit).context("wait for command")? {
            Some(status) => status,
            None => {
                warn!(timeout_secs = limit.as_secs(), "command timed out, killing");
                timed_out = true;
                child.kill().context("kill command")?;
                child.wait().context("wait command after kill")?
            }
        },
    };

    let (stdout, stdout_truncated) = join_output(stdout_handle).context("join stdout")?;
    let (stderr, stderr_truncated) = join_output(stderr_handle).context("join stderr")?;

    if stdout_truncated > 0 || stderr_truncated > 0 {
        warn!(stdout_truncated, stderr_truncated, "output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
        timed_out,
    })
}

fn join_output(handle: thread::JoinHandle<Result<(Vec<u8>, usize)>>) -> Result<(Vec<u8>, usize)> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let remaining = limit.saturating_sub(buf.len());
        if remaining > 0 {
            let keep = n.min(remaining);
            buf.extend_from_slice(&chunk[..keep]);
            truncated += n.saturating_sub(keep);
        } else {
            truncated += n;
        }
    }

    Ok((buf, truncated))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn captures_streams_and_exit_code() {
        let output = run_command(
            sh("printf 'a\\nb\\n'; printf oops >&2; exit 3"),
            None,
            DEFAULT_OUTPUT_LIMIT_BYTES,
        )
        .expect("run");
        let result = output.into_execution_result();
        assert_eq!(result.exit_code, Some(3));
        assert_eq!(result.stdout, "a\nb\n");
        assert_eq!(result.stderr, "oops");
        assert!(!result.timed_out);
    }

    #[test]
    fn output_beyond_limit_is_counted() {
        let output = run_command(sh("printf 0123456789"), None, 4).expect("run");
        assert_eq!(output.stdout, b"0123");
        assert_eq!(output.stdout_truncated, 6);
    }

    #[test]
    fn timeout_kills_child() {
        let output = run_command(
            sh("sleep 5"),
            Some(Duration::from_millis(100)),
            DEFAULT_OUTPUT_LIMIT_BYTES,
        )
        .expect("run");
        assert!(output.timed_out);
        assert_eq!(output.into_execution_result().exit_code, None);
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let err = run_command(
            Command::new("definitely-not-a-real-program-xyz"),
            None,
            DEFAULT_OUTPUT_LIMIT_BYTES,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("spawn command"));
    }

    #[test]
    fn system_spawner_runs_in_workdir() {
        let temp = tempfile::tempdir().expect("tempdir");
        let workdir = temp.path().canonicalize().expect("canonicalize");
        let invocation = Invocation {
            program: "pwd".to_string(),
            args: Vec::new(),
            workdir: workdir.clone(),
        };
        let result = SystemSpawner::default().spawn(&invocation).expect("spawn");
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.stdout.trim(), workdir.to_string_lossy());
    }

    #[test]
    fn command_line_joins_arguments() {
        let invocation = Invocation {
            program: "ruff".to_string(),
            args: vec!["check".into(), "--fix".into()],
            workdir: PathBuf::from("/tmp"),
        };
        assert_eq!(invocation.command_line(), "ruff check --fix");
    }
}
