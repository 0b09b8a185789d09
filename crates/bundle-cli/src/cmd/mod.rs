pub mod completions;
pub mod inspect;
pub mod score;
pub mod sets;

use std::fmt::Display;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use serde::Serialize;

use bundle_core::config::{ProjectConfig, load_config_file, load_project_config};
use bundle_core::error::ErrorCode;
use bundle_core::graph::{Direction, ParallelEdgePolicy, WeightedDigraph, load_graph};
use bundle_core::quota::{QuotaPolicy, QuotaTable};
use bundle_index::{BundleIndexConfig, Enumeration};

use crate::output::{CliError, OutputMode, render_error};

/// Render `err` with its code, then hand back an error for `main` to return.
pub fn report(output: OutputMode, code: ErrorCode, err: impl Display) -> anyhow::Error {
    let message = err.to_string();
    if let Err(render_err) = render_error(output, &CliError::from_code(code, message.clone())) {
        tracing::warn!(error = %render_err, "failed to render error");
    }
    anyhow::anyhow!(message)
}

/// Load a graph file, reporting failures with their error code.
pub fn open_graph(path: &Path, output: OutputMode) -> anyhow::Result<WeightedDigraph> {
    load_graph(path).map_err(|e| report(output, e.error_code(), format!("{}: {e}", path.display())))
}

// ---------------------------------------------------------------------------
// Shared scoring flags
// ---------------------------------------------------------------------------

/// Where quotas come from. At most one may be given.
#[derive(Args, Debug, Default)]
#[group(multiple = false)]
pub struct QuotaArgs {
    /// Same quota for every vertex.
    #[arg(long, value_name = "Q")]
    pub quota: Option<f64>,

    /// Quota = F × the vertex's strength in the scoring direction.
    #[arg(long, value_name = "F")]
    pub quota_fraction: Option<f64>,

    /// JSON object mapping every vertex label to its quota.
    #[arg(long, value_name = "PATH")]
    pub quota_file: Option<PathBuf>,
}

/// Flags shared by every command that scores vertices.
#[derive(Args, Debug, Default)]
pub struct ScoringArgs {
    /// Largest critical set size.
    #[arg(long, short = 'k')]
    pub k: Option<usize>,

    /// Which incident edges count: incoming or outgoing.
    #[arg(long)]
    pub direction: Option<Direction>,

    /// Weight of parallel edges: sum, first or max.
    #[arg(long)]
    pub parallel_edges: Option<ParallelEdgePolicy>,

    #[command(flatten)]
    pub quota: QuotaArgs,

    /// Config file to use instead of .bundle/config.toml.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Quota source after flags and config are merged.
#[derive(Debug, Clone, PartialEq)]
pub enum QuotaSource {
    Policy(QuotaPolicy),
    File(PathBuf),
}

impl QuotaSource {
    /// Short description for reports.
    pub fn describe(&self) -> String {
        match self {
            Self::Policy(QuotaPolicy::Uniform(q)) => format!("uniform {q}"),
            Self::Policy(QuotaPolicy::StrengthFraction(f)) => format!("strength-fraction {f}"),
            Self::File(path) => format!("file {}", path.display()),
        }
    }
}

/// Serializable view of the parameters a result was computed with.
#[derive(Debug, Clone, Serialize)]
pub struct Parameters {
    pub k: usize,
    pub direction: Direction,
    pub normalized: bool,
    pub workers: usize,
    pub parallel_edges: ParallelEdgePolicy,
    pub enumeration: Enumeration,
    pub quota: String,
}

impl Parameters {
    pub fn new(config: &BundleIndexConfig, quota: &QuotaSource) -> Self {
        Self {
            k: config.k,
            direction: config.direction,
            normalized: config.normalize,
            workers: config.workers,
            parallel_edges: config.parallel_edges,
            enumeration: config.enumeration,
            quota: quota.describe(),
        }
    }
}

impl ScoringArgs {
    /// Load the explicit or project config file.
    pub fn load_config(&self, project_root: &Path) -> anyhow::Result<ProjectConfig> {
        match &self.config {
            Some(path) => load_config_file(path),
            None => load_project_config(project_root),
        }
    }

    /// Merge flags over `file`. Flags win, then the file, then the built-in
    /// defaults the file already carries.
    pub fn resolve(&self, file: &ProjectConfig) -> anyhow::Result<(BundleIndexConfig, QuotaSource)> {
        let enumeration: Enumeration = file
            .index
            .enumeration
            .parse()
            .map_err(anyhow::Error::msg)
            .context("invalid [index] enumeration")?;

        let config = BundleIndexConfig {
            k: self.k.unwrap_or(file.index.k),
            normalize: file.index.normalize,
            direction: self.direction.unwrap_or(file.index.direction),
            workers: file.index.workers,
            parallel_edges: self.parallel_edges.unwrap_or(file.index.parallel_edges),
            enumeration,
            cancel: None,
        };

        let quota = if let Some(q) = self.quota.quota {
            QuotaSource::Policy(QuotaPolicy::Uniform(q))
        } else if let Some(f) = self.quota.quota_fraction {
            QuotaSource::Policy(QuotaPolicy::StrengthFraction(f))
        } else if let Some(path) = &self.quota.quota_file {
            QuotaSource::File(path.clone())
        } else {
            QuotaSource::Policy(file.quota)
        };

        Ok((config, quota))
    }
}

/// Build the quota table for `graph`, reporting failures with their code.
pub fn build_quotas(
    graph: &WeightedDigraph,
    source: &QuotaSource,
    config: &BundleIndexConfig,
    output: OutputMode,
) -> anyhow::Result<QuotaTable> {
    let result = match source {
        QuotaSource::Policy(policy) => {
            QuotaTable::from_policy(graph, *policy, config.direction, config.parallel_edges)
        }
        QuotaSource::File(path) => QuotaTable::from_json_file(path),
    };
    result.map_err(|e| report(output, e.error_code(), e))
}
