//! `bundle sets`: list the critical sets of one vertex.
//!
//! Shows every critical set up to size k with its combined weight and
//! whether it reaches the vertex's quota. The number of sets marked as
//! meeting the quota is the vertex's raw score.

use std::io::{self, Write};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;

use bundle_core::error::ErrorCode;
use bundle_core::graph::WeightedGraph;
use bundle_index::index::{set_weight, validate};
use bundle_index::{IndexError, SubsetGenerator};

use super::{Parameters, ScoringArgs, build_quotas, open_graph, report};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `bundle sets`.
#[derive(Args, Debug)]
pub struct SetsArgs {
    /// Graph file (`.json`, or a `from to [weight]` edge list).
    pub graph: PathBuf,

    /// Vertex label whose critical sets to list.
    pub vertex: String,

    #[command(flatten)]
    pub scoring: ScoringArgs,
}

#[derive(Debug, Serialize)]
struct SetEntry {
    members: Vec<String>,
    weight: f64,
    meets_quota: bool,
}

#[derive(Debug, Serialize)]
struct SetsReport {
    vertex: String,
    quota: f64,
    qualifying: usize,
    parameters: Parameters,
    sets: Vec<SetEntry>,
}

/// Execute `bundle sets`.
///
/// # Errors
///
/// Returns an error if inputs cannot be loaded, the vertex is unknown, or the
/// inputs fail the same validation `bundle score` applies.
pub fn run_sets(args: &SetsArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let file = args
        .scoring
        .load_config(project_root)
        .map_err(|e| report(output, ErrorCode::ConfigParseError, format!("{e:#}")))?;
    let (mut config, quota_source) = args
        .scoring
        .resolve(&file)
        .map_err(|e| report(output, ErrorCode::ConfigParseError, format!("{e:#}")))?;
    config.normalize = false;

    let graph = open_graph(&args.graph, output)?;
    let Some(v) = graph.find_vertex(&args.vertex) else {
        let err = IndexError::VertexNotFound(args.vertex.clone());
        return Err(report(output, err.error_code(), err));
    };

    let quotas = build_quotas(&graph, &quota_source, &config, output)?;
    let quota_by_vertex =
        validate(&graph, &quotas, &config).map_err(|e| report(output, e.error_code(), &e))?;
    let vertices = graph.vertices();
    let Some(quota) = vertices
        .iter()
        .zip(&quota_by_vertex)
        .find_map(|(&u, &q)| (u == v).then_some(q))
    else {
        return Err(report(
            output,
            ErrorCode::InternalUnexpected,
            format!("no validated quota for '{}'", args.vertex),
        ));
    };

    let candidates: Vec<_> = vertices.iter().copied().filter(|&u| u != v).collect();
    let generator = SubsetGenerator::new(&graph, v, config.k, config.direction);

    let mut sets = Vec::new();
    let flow = generator.enumerate(&candidates, config.enumeration, |subset| {
        let Some(weight) = set_weight(&graph, v, subset, config.direction, config.parallel_edges)
        else {
            return ControlFlow::Break(());
        };
        let mut members: Vec<String> =
            subset.iter().map(|&m| graph.label(m).to_string()).collect();
        members.sort();
        sets.push(SetEntry {
            members,
            weight,
            meets_quota: weight >= quota,
        });
        ControlFlow::Continue(())
    });
    if flow.is_break() {
        return Err(report(
            output,
            ErrorCode::InternalUnexpected,
            format!("critical set of '{}' has a member without an edge weight", args.vertex),
        ));
    }
    sets.sort_by(|a, b| a.members.len().cmp(&b.members.len()).then_with(|| a.members.cmp(&b.members)));

    let sets_report = SetsReport {
        vertex: args.vertex.clone(),
        quota,
        qualifying: sets.iter().filter(|s| s.meets_quota).count(),
        parameters: Parameters::new(&config, &quota_source),
        sets,
    };

    render_mode(output, &sets_report, render_text, render_pretty)
}

fn member_list(members: &[String]) -> String {
    if members.is_empty() {
        "{}".to_string()
    } else {
        format!("{{{}}}", members.join(", "))
    }
}

fn render_text(report: &SetsReport, w: &mut dyn Write) -> io::Result<()> {
    writeln!(
        w,
        "{} quota={} qualifying={} sets={}",
        report.vertex,
        report.quota,
        report.qualifying,
        report.sets.len()
    )?;
    for s in &report.sets {
        let mark = if s.meets_quota { "yes" } else { "no" };
        writeln!(w, "{}\t{}\t{mark}", member_list(&s.members), s.weight)?;
    }
    Ok(())
}

fn render_pretty(report: &SetsReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Critical sets of {}", report.vertex))?;
    pretty_kv(w, "k", report.parameters.k.to_string())?;
    pretty_kv(w, "Direction", report.parameters.direction.as_str())?;
    pretty_kv(w, "Quota", format!("{} ({})", report.quota, report.parameters.quota))?;
    pretty_kv(
        w,
        "Qualifying",
        format!("{} of {}", report.qualifying, report.sets.len()),
    )?;
    writeln!(w)?;
    for s in &report.sets {
        let mark = if s.meets_quota { "✓" } else { " " };
        writeln!(w, "  {mark} {:<40} {}", member_list(&s.members), s.weight)?;
    }
    Ok(())
}
