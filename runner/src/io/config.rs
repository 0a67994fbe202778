//! Runner configuration stored in `toolrunner.toml`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::catalog::{ToolCatalog, ToolSpec, default_tools};
use crate::io::process::{DEFAULT_OUTPUT_LIMIT_BYTES, SystemSpawner};

pub const CONFIG_FILE: &str = "toolrunner.toml";

/// Runner configuration (TOML).
///
/// Missing fields take defaults. A `[tools]` table replaces the default
/// catalog entirely.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RunnerConfig {
    /// Sandboxed project directory. Relative paths resolve against the
    /// current directory.
    pub project_root: PathBuf,

    /// Kill tool processes after this many seconds. Unset waits forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Keep at most this many bytes of each of stdout and stderr.
    pub output_limit_bytes: usize,

    pub tools: BTreeMap<String, ToolSpec>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("temp/project"),
            timeout_secs: None,
            output_limit_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
            tools: default_tools(),
        }
    }
}

impl RunnerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.project_root.as_os_str().is_empty() {
            return Err(anyhow!("project_root must not be empty"));
        }
        if self.timeout_secs == Some(0) {
            return Err(anyhow!("timeout_secs must be > 0 when set"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.tools.is_empty() {
            return Err(anyhow!("tools must define at least one tool"));
        }
        for (name, spec) in &self.tools {
            if !is_valid_tool_name(name) {
                return Err(anyhow!(
                    "tool name '{name}' must be non-empty and use only [a-z0-9_-]"
                ));
            }
            if spec.program.trim().is_empty() {
                return Err(anyhow!("tools.{name}.program must not be empty"));
            }
        }
        Ok(())
    }

    pub fn catalog(&self) -> ToolCatalog {
        ToolCatalog::new(self.tools.clone())
    }

    pub fn spawner(&self) -> SystemSpawner {
        SystemSpawner {
            timeout: self.timeout_secs.map(Duration::from_secs),
            output_limit_bytes: self.output_limit_bytes,
        }
    }
}

fn is_valid_tool_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || ch == '-')
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `RunnerConfig::default()`.
pub fn load_config(path: &Path) -> Result<RunnerConfig> {
    if !path.exists() {
        let cfg = RunnerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: RunnerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &RunnerConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, RunnerConfig::default());
        assert_eq!(cfg.spawner().timeout, None);
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(CONFIG_FILE);
        let cfg = RunnerConfig {
            timeout_secs: Some(600),
            ..RunnerConfig::default()
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn tools_table_replaces_default_catalog() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"
project_root = "work"

[tools.uv]
program = "/usr/local/bin/uv"
accepts_args = true
strip_program_prefix = true
tail = 50
"#,
        )
        .expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.project_root, PathBuf::from("work"));
        assert_eq!(cfg.output_limit_bytes, DEFAULT_OUTPUT_LIMIT_BYTES);
        let names: Vec<&str> = cfg.tools.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["uv"]);
        assert_eq!(cfg.tools["uv"].tail, Some(50));
        assert_eq!(cfg.tools["uv"].failure_code, None);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let cfg = RunnerConfig {
            timeout_secs: Some(0),
            ..RunnerConfig::default()
        };
        assert!(cfg.validate().is_err());

        let mut cfg = RunnerConfig::default();
        let spec = cfg.tools["uv"].clone();
        cfg.tools.insert("Bad Name".to_string(), spec);
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("Bad Name"));

        let mut cfg = RunnerConfig::default();
        if let Some(spec) = cfg.tools.get_mut("lint") {
            spec.program = " ".to_string();
        }
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unknown_tool_fields_are_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, "[tools.lint]\nprogram = \"ruff\"\nshell = true\n").expect("write");
        assert!(load_config(&path).is_err());
    }
}
