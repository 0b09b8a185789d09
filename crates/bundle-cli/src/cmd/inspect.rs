//! `bundle inspect`: structural statistics of a graph file.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use bundle_core::graph::GraphStats;

use super::open_graph;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `bundle inspect`.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Graph file (`.json`, or a `from to [weight]` edge list).
    pub graph: PathBuf,
}

#[derive(Debug, Serialize)]
struct InspectReport {
    graph: String,
    graph_hash: String,
    #[serde(flatten)]
    stats: GraphStats,
}

/// Execute `bundle inspect`.
///
/// # Errors
///
/// Returns an error if the graph cannot be loaded.
pub fn run_inspect(args: &InspectArgs, output: OutputMode) -> anyhow::Result<()> {
    let graph = open_graph(&args.graph, output)?;
    let report = InspectReport {
        graph: args.graph.display().to_string(),
        graph_hash: graph.content_hash(),
        stats: GraphStats::from_graph(&graph),
    };
    render_mode(output, &report, render_text, render_pretty)
}

fn render_text(report: &InspectReport, w: &mut dyn Write) -> io::Result<()> {
    let s = &report.stats;
    writeln!(w, "hash\t{}", report.graph_hash)?;
    writeln!(w, "directed\t{}", s.directed)?;
    writeln!(w, "vertices\t{}", s.vertex_count)?;
    writeln!(w, "edges\t{}", s.edge_count)?;
    writeln!(w, "density\t{:.6}", s.density)?;
    writeln!(w, "weak_components\t{}", s.weak_component_count)?;
    writeln!(w, "isolated\t{}", s.isolated_vertex_count)?;
    writeln!(w, "self_loops\t{}", s.self_loop_count)?;
    writeln!(w, "parallel_pairs\t{}", s.parallel_pair_count)?;
    writeln!(w, "max_in_strength\t{}", s.max_in_strength)?;
    writeln!(w, "max_out_strength\t{}", s.max_out_strength)
}

fn render_pretty(report: &InspectReport, w: &mut dyn Write) -> io::Result<()> {
    let s = &report.stats;
    pretty_section(w, &format!("Graph {}", report.graph))?;
    pretty_kv(w, "Hash", &report.graph_hash)?;
    pretty_kv(w, "Kind", if s.directed { "directed" } else { "undirected" })?;
    pretty_kv(w, "Vertices", s.vertex_count.to_string())?;
    pretty_kv(w, "Edges", s.edge_count.to_string())?;
    pretty_kv(w, "Density", format!("{:.4}", s.density))?;
    pretty_kv(w, "Components", s.weak_component_count.to_string())?;
    pretty_kv(w, "Isolated", s.isolated_vertex_count.to_string())?;
    pretty_kv(w, "Self-loops", s.self_loop_count.to_string())?;
    pretty_kv(w, "Parallel pairs", s.parallel_pair_count.to_string())?;
    pretty_kv(w, "Max in-strength", s.max_in_strength.to_string())?;
    pretty_kv(w, "Max out-strength", s.max_out_strength.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_core::graph::WeightedDigraph;

    #[test]
    fn text_output_is_tab_separated() {
        let g = WeightedDigraph::from_unit_edges(&["A", "B", "Z"], &[("A", "B")]).expect("graph");
        let report = InspectReport {
            graph: "g.edges".to_string(),
            graph_hash: g.content_hash(),
            stats: GraphStats::from_graph(&g),
        };
        let mut buf = Vec::new();
        render_text(&report, &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("vertices\t3\n"));
        assert!(text.contains("isolated\t1\n"));
        assert!(text.contains("hash\tblake3:"));
    }
}
