#![forbid(unsafe_code)]

mod cmd;
mod output;

use bundle_core::config::load_user_config;
use clap::{CommandFactory, Parser, Subcommand};
use output::{OutputMode, resolve_output_mode};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "bundle",
    author,
    version,
    about = "bundle: group-based vertex centrality for weighted graphs",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format: pretty, text or json.
    #[arg(long, value_enum, global = true)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Scoring",
        about = "Compute Bundle Index scores",
        long_about = "Compute the Bundle Index of every vertex: the number of critical sets \
                      of at most k neighbors whose combined edge weight reaches the vertex's quota.",
        after_help = "EXAMPLES:\n    # Score with k = 2 and quotas at 45% of in-strength, top 15\n    bundle score graph.edges --k 2 --quota-fraction 0.45 --top 15\n\n    # Raw counts on 8 worker threads\n    bundle score graph.json --raw --workers 8\n\n    # Emit machine-readable output\n    bundle score graph.edges --format json"
    )]
    Score(cmd::score::ScoreArgs),

    #[command(
        next_help_heading = "Scoring",
        about = "List the critical sets of one vertex",
        long_about = "List every critical set of a vertex with its weight and whether it meets the quota.",
        after_help = "EXAMPLES:\n    # Sets of size at most 2 feeding vertex C\n    bundle sets graph.edges C --k 2\n\n    # Look at outgoing edges instead\n    bundle sets graph.edges C --direction outgoing"
    )]
    Sets(cmd::sets::SetsArgs),

    #[command(
        next_help_heading = "Graph",
        about = "Show graph statistics",
        long_about = "Show vertex and edge counts, density, components and strengths of a graph file.",
        after_help = "EXAMPLES:\n    # Inspect an edge list\n    bundle inspect graph.edges\n\n    # Emit machine-readable output\n    bundle inspect graph.json --json"
    )]
    Inspect(cmd::inspect::InspectArgs),

    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Install bash completions\n    bundle completions bash > ~/.local/share/bash-completion/completions/bundle"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("BUNDLE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "bundle=debug,info"
        } else {
            "bundle=info,warn"
        })
    });

    let format = env::var("BUNDLE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let user = load_user_config().unwrap_or_else(|err| {
        warn!(error = %format!("{err:#}"), "ignoring unreadable user config");
        bundle_core::config::UserConfig::default()
    });
    let output = resolve_output_mode(cli.format, cli.json, user.output.as_deref());
    let project_root = env::current_dir()?;

    match cli.command {
        Commands::Score(ref args) => cmd::score::run_score(args, output, &project_root),
        Commands::Sets(ref args) => cmd::sets::run_sets(args, output, &project_root),
        Commands::Inspect(ref args) => cmd::inspect::run_inspect(args, output),
        Commands::Completions(ref args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}
