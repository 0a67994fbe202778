//! Tool definitions, the default catalog, and function-calling schemas.

use std::collections::BTreeMap;
use std::path::Path;

use jsonschema::Draft;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::core::types::FailurePolicy;
use crate::error::{ToolError, ToolResult};

/// Lines of output returned by `uv` and `test` unless the call asks otherwise.
pub const DEFAULT_TAIL: usize = 100;

/// One external tool an agent may call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ToolSpec {
    #[serde(default)]
    pub description: String,

    /// Executable name or absolute path.
    pub program: String,

    /// Fixed leading arguments, before any call arguments or target file.
    #[serde(default)]
    pub args: Vec<String>,

    /// Exit codes at or above this value fail. Unset means any nonzero exit fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_code: Option<i32>,

    /// Default number of trailing output lines. Unset returns full stdout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tail: Option<usize>,

    /// Whether the call may scope the run to one file inside the project.
    #[serde(default)]
    pub accepts_file: bool,

    /// Whether the call may pass free arguments.
    #[serde(default)]
    pub accepts_args: bool,

    /// Drop a leading argument that repeats the program name (`["uv", "sync"]`).
    #[serde(default)]
    pub strip_program_prefix: bool,
}

impl ToolSpec {
    pub fn failure_policy(&self) -> FailurePolicy {
        match self.failure_code {
            Some(code) => FailurePolicy::AtLeast { code },
            None => FailurePolicy::NonZero,
        }
    }

    /// Returns true if `arg` names this tool or its program.
    pub fn is_program_name(&self, name: &str, arg: &str) -> bool {
        arg == name
            || arg == self.program
            || Path::new(&self.program)
                .file_name()
                .is_some_and(|file_name| file_name == arg)
    }

    /// JSON Schema for the argument object a call may pass.
    pub fn parameters_schema(&self) -> Value {
        let mut properties = Map::new();
        if self.accepts_args {
            properties.insert(
                "args".to_string(),
                json!({
                    "type": "array",
                    "items": { "type": "string" },
                    "description": format!("Command line arguments passed to {}.", self.program),
                }),
            );
        }
        if self.accepts_file {
            properties.insert(
                "file".to_string(),
                json!({
                    "type": "string",
                    "description": "Optional file to limit the run to. Only use it if the file is known to exist. Relative paths resolve under the project root.",
                }),
            );
        }
        properties.insert(
            "tail".to_string(),
            json!({
                "type": "integer",
                "minimum": 0,
                "description": "Number of trailing output lines to return.",
            }),
        );
        json!({
            "type": "object",
            "properties": properties,
            "additionalProperties": false,
        })
    }

    /// Function-calling schema: `{ name, description, parameters }`.
    pub fn schema(&self, name: &str) -> Value {
        json!({
            "name": name,
            "description": self.description,
            "parameters": self.parameters_schema(),
        })
    }
}

/// The named set of tools a runner can execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCatalog {
    tools: BTreeMap<String, ToolSpec>,
}

impl ToolCatalog {
    pub fn new(tools: BTreeMap<String, ToolSpec>) -> Self {
        Self { tools }
    }

    pub fn get(&self, name: &str) -> ToolResult<&ToolSpec> {
        self.tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    /// Schemas for every tool, ordered by name.
    pub fn schemas(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|(name, spec)| spec.schema(name))
            .collect()
    }
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::new(default_tools())
    }
}

/// `uv`, `test`, `lint` and `fix`.
pub fn default_tools() -> BTreeMap<String, ToolSpec> {
    let mut tools = BTreeMap::new();
    tools.insert(
        "uv".to_string(),
        ToolSpec {
            description: "Runs uv with the given command line arguments and returns the output."
                .to_string(),
            program: "uv".to_string(),
            args: Vec::new(),
            failure_code: None,
            tail: Some(DEFAULT_TAIL),
            accepts_file: false,
            accepts_args: true,
            strip_program_prefix: true,
        },
    );
    tools.insert(
        "test".to_string(),
        ToolSpec {
            description: "Runs the project's pytest suite and returns the output.".to_string(),
            program: "uv".to_string(),
            args: to_strings(&["run", "python", "-m", "pytest", "tests"]),
            failure_code: None,
            tail: Some(DEFAULT_TAIL),
            accepts_file: false,
            accepts_args: false,
            strip_program_prefix: false,
        },
    );
    tools.insert(
        "lint".to_string(),
        ToolSpec {
            description: "Runs the security linter on the project and returns one JSON issue per line."
                .to_string(),
            program: "ruff".to_string(),
            args: to_strings(&["check", "--select", "S", "--output-format", "json-lines"]),
            failure_code: Some(2),
            tail: None,
            accepts_file: true,
            accepts_args: false,
            strip_program_prefix: false,
        },
    );
    tools.insert(
        "fix".to_string(),
        ToolSpec {
            description: "Runs deterministic lint autofixes on the project, editing files in place."
                .to_string(),
            program: "ruff".to_string(),
            args: to_strings(&["check", "--fix"]),
            failure_code: Some(2),
            tail: None,
            accepts_file: true,
            accepts_args: false,
            strip_program_prefix: false,
        },
    );
    tools
}

fn to_strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| (*arg).to_string()).collect()
}

/// Validate a call's argument object against the tool's parameter schema.
pub fn validate_arguments(name: &str, spec: &ToolSpec, arguments: &Value) -> ToolResult<()> {
    let schema = spec.parameters_schema();
    let compiled = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .map_err(|err| ToolError::invalid_arguments(name, format!("compile schema: {err}")))?;
    let messages: Vec<String> = compiled
        .iter_errors(arguments)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        return Err(ToolError::invalid_arguments(name, messages.join("; ")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn default_catalog_has_four_tools() {
        let catalog = ToolCatalog::default();
        let names: Vec<&str> = catalog.names().collect();
        assert_eq!(names, vec!["fix", "lint", "test", "uv"]);
    }

    #[test]
    fn lint_tolerates_issue_exit_code() {
        let catalog = ToolCatalog::default();
        let lint = catalog.get("lint").expect("lint");
        assert!(!lint.failure_policy().is_failure(Some(1)));
        assert!(lint.failure_policy().is_failure(Some(2)));

        let uv = catalog.get("uv").expect("uv");
        assert!(uv.failure_policy().is_failure(Some(1)));
    }

    #[test]
    fn unknown_tool_is_reported() {
        let err = ToolCatalog::default().get("rm").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownTool);
    }

    #[test]
    fn schema_exposes_only_accepted_parameters() {
        let catalog = ToolCatalog::default();
        let lint = catalog.get("lint").expect("lint").schema("lint");
        assert_eq!(lint["name"], "lint");
        assert!(lint["parameters"]["properties"]["file"].is_object());
        assert!(lint["parameters"]["properties"]["args"].is_null());

        let uv = catalog.get("uv").expect("uv").schema("uv");
        assert!(uv["parameters"]["properties"]["args"].is_object());
        assert!(uv["parameters"]["properties"]["file"].is_null());
    }

    #[test]
    fn program_prefix_matches_binary_file_name() {
        let spec = ToolSpec {
            program: "/usr/local/bin/uv".to_string(),
            ..default_tools()["uv"].clone()
        };
        assert!(spec.is_program_name("uv", "uv"));
        assert!(spec.is_program_name("python-deps", "uv"));
        assert!(!spec.is_program_name("uv", "sync"));
    }

    #[test]
    fn arguments_are_validated_against_schema() {
        let catalog = ToolCatalog::default();
        let lint = catalog.get("lint").expect("lint");
        validate_arguments("lint", lint, &json!({ "file": "src/app.py", "tail": 5 }))
            .expect("valid");

        let err = validate_arguments("lint", lint, &json!({ "args": ["--fix"] })).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArguments);

        let err = validate_arguments("lint", lint, &json!({ "tail": -1 })).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArguments);
    }
}
