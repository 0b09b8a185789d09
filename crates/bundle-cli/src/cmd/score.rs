//! `bundle score`: Bundle Index scores for every vertex of a graph.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;
use tracing::info;

use bundle_core::error::ErrorCode;
use bundle_core::graph::WeightedGraph;
use bundle_index::{BundleIndex, Enumeration};

use super::{Parameters, ScoringArgs, build_quotas, open_graph, report};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `bundle score`.
#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Graph file (`.json`, or a `from to [weight]` edge list).
    pub graph: PathBuf,

    #[command(flatten)]
    pub scoring: ScoringArgs,

    /// Report raw critical set counts instead of normalized shares.
    #[arg(long)]
    pub raw: bool,

    /// Worker threads.
    #[arg(long, short = 'j')]
    pub workers: Option<usize>,

    /// Subset enumeration strategy: auto, recursive or iterative.
    #[arg(long)]
    pub enumeration: Option<Enumeration>,

    /// Only show the N highest-ranked vertices.
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,
}

#[derive(Debug, Serialize)]
struct RankedScore {
    rank: usize,
    vertex: String,
    score: f64,
}

#[derive(Debug, Serialize)]
struct ScoreReport {
    graph: String,
    graph_hash: String,
    vertex_count: usize,
    parameters: Parameters,
    scores: Vec<RankedScore>,
}

/// Execute `bundle score`.
///
/// # Errors
///
/// Returns an error if the config, graph or quotas cannot be loaded, or if
/// the computation fails. Each is rendered with its error code first.
pub fn run_score(args: &ScoreArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let file = args
        .scoring
        .load_config(project_root)
        .map_err(|e| report(output, ErrorCode::ConfigParseError, format!("{e:#}")))?;
    let (mut config, quota_source) = args
        .scoring
        .resolve(&file)
        .map_err(|e| report(output, ErrorCode::ConfigParseError, format!("{e:#}")))?;
    if args.raw {
        config.normalize = false;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(enumeration) = args.enumeration {
        config.enumeration = enumeration;
    }

    let graph = open_graph(&args.graph, output)?;
    let quotas = build_quotas(&graph, &quota_source, &config, output)?;

    let index = BundleIndex::compute(&graph, &quotas, &config)
        .map_err(|e| report(output, e.error_code(), &e))?;

    let limit = args.top.unwrap_or(usize::MAX);
    let scores: Vec<RankedScore> = index
        .ranked()
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, (vertex, score))| RankedScore {
            rank: i + 1,
            vertex,
            score,
        })
        .collect();
    info!(shown = scores.len(), total = index.len(), "ranked scores");

    let score_report = ScoreReport {
        graph: args.graph.display().to_string(),
        graph_hash: graph.content_hash(),
        vertex_count: graph.vertex_count(),
        parameters: Parameters::new(&config, &quota_source),
        scores,
    };

    render_mode(output, &score_report, render_text, render_pretty)
}

fn format_score(score: f64, normalized: bool) -> String {
    if normalized {
        format!("{score:.6}")
    } else {
        format!("{score}")
    }
}

fn render_text(report: &ScoreReport, w: &mut dyn Write) -> io::Result<()> {
    let p = &report.parameters;
    writeln!(
        w,
        "{} k={} direction={} normalized={} quota=\"{}\" parallel_edges={}",
        report.graph_hash, p.k, p.direction, p.normalized, p.quota, p.parallel_edges
    )?;
    for s in &report.scores {
        writeln!(w, "{}\t{}\t{}", s.rank, s.vertex, format_score(s.score, p.normalized))?;
    }
    Ok(())
}

fn render_pretty(report: &ScoreReport, w: &mut dyn Write) -> io::Result<()> {
    let p = &report.parameters;
    pretty_section(w, "Bundle Index")?;
    pretty_kv(w, "Graph", &report.graph)?;
    pretty_kv(w, "Hash", &report.graph_hash)?;
    pretty_kv(w, "Vertices", report.vertex_count.to_string())?;
    pretty_kv(w, "k", p.k.to_string())?;
    pretty_kv(w, "Direction", p.direction.as_str())?;
    pretty_kv(w, "Quota", &p.quota)?;
    pretty_kv(w, "Parallel edges", p.parallel_edges.as_str())?;
    pretty_kv(w, "Workers", p.workers.to_string())?;
    pretty_kv(w, "Scores", if p.normalized { "normalized" } else { "raw" })?;
    writeln!(w)?;

    if report.scores.is_empty() {
        return writeln!(w, "(no vertices)");
    }
    let width = report
        .scores
        .iter()
        .map(|s| s.vertex.chars().count())
        .max()
        .unwrap_or(0)
        .max("VERTEX".len());
    writeln!(w, "{:>4}  {:<width$}  SCORE", "RANK", "VERTEX")?;
    for s in &report.scores {
        writeln!(
            w,
            "{:>4}  {:<width$}  {}",
            s.rank,
            s.vertex,
            format_score(s.score, p.normalized)
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_core::graph::{Direction, ParallelEdgePolicy};

    fn sample_report() -> ScoreReport {
        ScoreReport {
            graph: "g.edges".to_string(),
            graph_hash: "blake3:abc".to_string(),
            vertex_count: 2,
            parameters: Parameters {
                k: 2,
                direction: Direction::Incoming,
                normalized: false,
                workers: 1,
                parallel_edges: ParallelEdgePolicy::Sum,
                enumeration: Enumeration::Auto,
                quota: "uniform 1".to_string(),
            },
            scores: vec![
                RankedScore {
                    rank: 1,
                    vertex: "C".to_string(),
                    score: 6.0,
                },
                RankedScore {
                    rank: 2,
                    vertex: "A".to_string(),
                    score: 1.0,
                },
            ],
        }
    }

    #[test]
    fn text_output_has_header_and_rows() {
        let mut buf = Vec::new();
        render_text(&sample_report(), &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("blake3:abc k=2 direction=incoming"));
        assert_eq!(lines[1], "1\tC\t6");
        assert_eq!(lines[2], "2\tA\t1");
    }

    #[test]
    fn pretty_output_aligns_columns() {
        let mut buf = Vec::new();
        render_pretty(&sample_report(), &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("Bundle Index"));
        assert!(text.contains("RANK  VERTEX  SCORE"));
        assert!(text.contains("   1  C       6"));
    }

    #[test]
    fn normalized_scores_use_fixed_precision() {
        assert_eq!(format_score(0.25, true), "0.250000");
        assert_eq!(format_score(7.0, false), "7");
    }
}
