//! Sandboxed command runner for agent tools.
//!
//! Runs a fixed catalog of external tools (`uv`, pytest, `ruff`) and file
//! operations against one project directory, and prints either the tool
//! output or an `Error: ...` line for the calling agent.

use std::io::Read as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use toolrunner::core::types::ToolCall;
use toolrunner::error::{ToolError, ToolResponse, ToolResult};
use toolrunner::exit_codes;
use toolrunner::io::config::{CONFIG_FILE, RunnerConfig, load_config};
use toolrunner::io::files::{list_files, read_file, save_file};
use toolrunner::io::init::{InitOptions, init_project};
use toolrunner::io::sandbox::Sandbox;
use toolrunner::logging;
use toolrunner::runner::ToolRunner;

#[derive(Parser)]
#[command(
    name = "toolrunner",
    version,
    about = "Sandboxed command runner for agent tools"
)]
struct Cli {
    /// Config file (TOML). Defaults apply if it does not exist.
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Override the project root from the config.
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Print a JSON response instead of plain text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the project directory.
    Init {
        /// Wipe and recreate it if it already exists.
        #[arg(short, long)]
        force: bool,
    },
    /// Run a tool from the catalog.
    Run {
        tool: String,
        /// Limit the run to one file inside the project.
        #[arg(long)]
        file: Option<PathBuf>,
        /// Number of trailing output lines to print.
        #[arg(long)]
        tail: Option<usize>,
        /// Arguments passed through to the tool (after `--`).
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Run a tool with a JSON argument object, as an agent would.
    Call {
        tool: String,
        #[arg(default_value = "{}")]
        input: String,
    },
    /// Print the function-calling schemas of all tools.
    Tools,
    /// Print a file inside the project.
    Read { path: PathBuf },
    /// Save stdin to a file inside the project.
    Write {
        path: PathBuf,
        /// Replace the file if it exists.
        #[arg(long)]
        overwrite: bool,
    },
    /// List a directory inside the project.
    Ls { dir: Option<PathBuf> },
}

fn main() {
    logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let mut config = load_config(&cli.config)?;
    if let Some(root) = cli.root {
        config.project_root = root;
    }
    // Config and project-root problems escape as `Err`; everything a tool
    // call can hit becomes a response.
    let result = match cli.command {
        Command::Init { force } => return cmd_init(&config.project_root, force),
        Command::Tools => return cmd_tools(&config),
        Command::Run {
            tool,
            file,
            tail,
            args,
        } => {
            let mut call = ToolCall::new(tool).with_args(args);
            if let Some(file) = file {
                call = call.with_file(file);
            }
            call.tail = tail;
            build_runner(&config)?.run(&call)
        }
        Command::Call { tool, input } => cmd_call(&build_runner(&config)?, &tool, &input),
        Command::Read { path } => read_file(&Sandbox::new(&config.project_root)?, &path),
        Command::Write { path, overwrite } => {
            cmd_write(&Sandbox::new(&config.project_root)?, &path, overwrite)
        }
        Command::Ls { dir } => list_files(&Sandbox::new(&config.project_root)?, dir.as_deref())
            .map(|names| names.join("\n")),
    };
    respond(&result, cli.json)
}

fn build_runner(config: &RunnerConfig) -> Result<ToolRunner> {
    let sandbox = Sandbox::new(&config.project_root)?;
    Ok(ToolRunner::new(sandbox, config.catalog(), config.spawner()))
}

fn cmd_init(root: &Path, force: bool) -> Result<i32> {
    let root = init_project(root, &InitOptions { force })?;
    println!("{}", root.display());
    Ok(exit_codes::OK)
}

fn cmd_tools(config: &RunnerConfig) -> Result<i32> {
    let schemas = Value::Array(config.catalog().schemas());
    let rendered = serde_json::to_string_pretty(&schemas).context("serialize tool schemas")?;
    println!("{rendered}");
    Ok(exit_codes::OK)
}

fn cmd_call(runner: &ToolRunner, tool: &str, input: &str) -> ToolResult {
    let arguments: Value = serde_json::from_str(input)
        .map_err(|err| ToolError::invalid_arguments(tool, format!("parse JSON arguments: {err}")))?;
    runner.call(tool, &arguments)
}

fn cmd_write(sandbox: &Sandbox, path: &Path, overwrite: bool) -> ToolResult {
    let mut contents = String::new();
    std::io::stdin()
        .read_to_string(&mut contents)
        .context("read stdin")
        .map_err(ToolError::Io)?;
    let saved = save_file(sandbox, path, &contents, overwrite)?;
    Ok(format!("Saved {}", sandbox.relative(&saved).display()))
}

fn respond(result: &ToolResult, json: bool) -> Result<i32> {
    let response = ToolResponse::from_result(result);
    if json {
        let rendered = serde_json::to_string(&response).context("serialize response")?;
        println!("{rendered}");
    } else {
        println!("{}", response.render_text());
    }
    Ok(match result {
        Ok(_) => exit_codes::OK,
        Err(err) => exit_codes::for_error(err.kind()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_run_with_passthrough_args() {
        let cli = Cli::parse_from(["toolrunner", "run", "uv", "--tail", "5", "--", "sync"]);
        match cli.command {
            Command::Run {
                tool, tail, args, ..
            } => {
                assert_eq!(tool, "uv");
                assert_eq!(tail, Some(5));
                assert_eq!(args, vec!["sync".to_string()]);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn parse_run_with_file() {
        let cli = Cli::parse_from(["toolrunner", "--json", "run", "lint", "--file", "app.py"]);
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Command::Run { file: Some(ref file), .. } if file == Path::new("app.py")
        ));
    }

    #[test]
    fn parse_call_defaults_to_empty_object() {
        let cli = Cli::parse_from(["toolrunner", "call", "test"]);
        assert!(matches!(cli.command, Command::Call { ref input, .. } if input == "{}"));
    }

    #[test]
    fn parse_init_force() {
        let cli = Cli::parse_from(["toolrunner", "init", "--force"]);
        assert!(matches!(cli.command, Command::Init { force: true }));
        assert_eq!(cli.config, PathBuf::from(CONFIG_FILE));
    }
}
