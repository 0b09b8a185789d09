use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::graph::{Direction, ParallelEdgePolicy};
use crate::quota::QuotaPolicy;

/// Relative location of the project config file.
pub const PROJECT_CONFIG_PATH: &str = ".bundle/config.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub quota: QuotaPolicy,
}

/// Scoring defaults. CLI flags win over every field here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default = "default_true")]
    pub normalize: bool,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub parallel_edges: ParallelEdgePolicy,
    /// `auto`, `recursive` or `iterative`.
    #[serde(default = "default_enumeration")]
    pub enumeration: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            normalize: default_true(),
            direction: Direction::default(),
            workers: default_workers(),
            parallel_edges: ParallelEdgePolicy::default(),
            enumeration: default_enumeration(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

/// Load `.bundle/config.toml` under `project_root`, or defaults if absent.
///
/// # Errors
///
/// Fails if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(PROJECT_CONFIG_PATH);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }
    load_config_file(&path)
}

/// Load an explicitly named config file. Unlike the project lookup, a missing
/// file is an error.
///
/// # Errors
///
/// Fails if the file cannot be read or parsed.
pub fn load_config_file(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load `<config_dir>/bundle/config.toml`, or defaults if absent.
///
/// # Errors
///
/// Fails if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("bundle/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

const fn default_true() -> bool {
    true
}

const fn default_k() -> usize {
    1
}

const fn default_workers() -> usize {
    1
}

fn default_enumeration() -> String {
    "auto".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_project_config(root: &Path, content: &str) {
        let dir = root.join(".bundle");
        std::fs::create_dir_all(&dir).expect("create .bundle");
        std::fs::write(dir.join("config.toml"), content).expect("write config");
    }

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = tempfile::tempdir().expect("tempdir");
        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.index.k, 1);
        assert!(cfg.index.normalize);
        assert_eq!(cfg.index.direction, Direction::Incoming);
        assert_eq!(cfg.index.workers, 1);
        assert_eq!(cfg.index.parallel_edges, ParallelEdgePolicy::Sum);
        assert_eq!(cfg.index.enumeration, "auto");
        assert_eq!(cfg.quota, QuotaPolicy::Uniform(1.0));
    }

    #[test]
    fn project_config_parses_all_sections() {
        let root = tempfile::tempdir().expect("tempdir");
        write_project_config(
            root.path(),
            r#"
[index]
k = 2
normalize = false
direction = "outgoing"
workers = 8
parallel_edges = "max"
enumeration = "iterative"

[quota]
policy = "strength-fraction"
value = 0.45
"#,
        );

        let cfg = load_project_config(root.path()).expect("load");
        assert_eq!(cfg.index.k, 2);
        assert!(!cfg.index.normalize);
        assert_eq!(cfg.index.direction, Direction::Outgoing);
        assert_eq!(cfg.index.workers, 8);
        assert_eq!(cfg.index.parallel_edges, ParallelEdgePolicy::Max);
        assert_eq!(cfg.index.enumeration, "iterative");
        assert_eq!(cfg.quota, QuotaPolicy::StrengthFraction(0.45));
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let root = tempfile::tempdir().expect("tempdir");
        write_project_config(root.path(), "[index]\nk = 3\n");
        let cfg = load_project_config(root.path()).expect("load");
        assert_eq!(cfg.index.k, 3);
        assert_eq!(cfg.index.workers, 1);
        assert_eq!(cfg.quota, QuotaPolicy::default());
    }

    #[test]
    fn malformed_config_reports_path() {
        let root = tempfile::tempdir().expect("tempdir");
        write_project_config(root.path(), "[index\nk = ");
        let err = load_project_config(root.path()).expect_err("malformed");
        assert!(format!("{err:#}").contains("config.toml"));
    }

    #[test]
    fn explicit_config_file_must_exist() {
        let root = tempfile::tempdir().expect("tempdir");
        let err = load_config_file(&root.path().join("nope.toml")).expect_err("missing");
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn user_config_parses_output() {
        let cfg: UserConfig = toml::from_str("output = \"json\"\n").expect("parse");
        assert_eq!(cfg.output.as_deref(), Some("json"));
    }
}
