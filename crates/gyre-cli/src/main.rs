#![forbid(unsafe_code)]

mod cmd;
mod output;

use std::env;

use clap::{CommandFactory, Parser, Subcommand};
use output::OutputMode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "gyre: dependency-cycle discovery and fair sampling",
    long_about = None
)]
struct Cli {
    /// Emit JSON summaries instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Decompose a dependency graph into cyclic components",
        long_about = "Build the dependency graph from a dependency_graph.json record, \
                      partition it into cyclic strongly connected components, and write \
                      the component report (with PageRank node features).",
        after_help = "EXAMPLES:\n    gyre sccs --graph dependency_graph.json --out scc_report.json"
    )]
    Sccs(cmd::sccs::SccsArgs),

    #[command(
        about = "Build a repository's edge-disjoint cycle catalog",
        long_about = "Discover candidate cycles per cyclic component (exact enumeration or \
                      seeded random-walk sampling), pack them edge-disjoint, and write the \
                      cycle catalog.",
        after_help = "EXAMPLES:\n    gyre catalog --graph dependency_graph.json --out cycle_catalog.json \\\n        --repo payments --branch main --strategy sample --seed 12345"
    )]
    Catalog(cmd::catalog::CatalogArgs),

    #[command(
        about = "Select a fair cross-corpus sample of cycles",
        long_about = "Load cycle catalogs for every repository in the repos file, select a \
                      length-stratified, repository-fair sample, and write the manifest \
                      (one `<repo> <branch> <cycle-id>` per line).",
        after_help = "EXAMPLES:\n    gyre select --repos repos.txt --results-root results --total 30 \\\n        --order desc --out cycles_to_analyze.txt"
    )]
    Select(cmd::select::SelectArgs),

    #[command(about = "Generate shell completions")]
    Completions {
        /// Target shell.
        shell: clap_complete::Shell,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("GYRE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "gyre=debug,info"
        } else {
            "gyre=info,warn"
        })
    });

    let format = env::var("GYRE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false)).init();
        }
        _ => {
            registry.with(fmt::layer().compact()).init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let output = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Pretty
    };

    match cli.command {
        Commands::Sccs(args) => cmd::sccs::run_sccs(&args, output),
        Commands::Catalog(args) => cmd::catalog::run_catalog(&args, output),
        Commands::Select(args) => cmd::select::run_select(&args, output),
        Commands::Completions { shell } => {
            cmd::completions::run_completions(shell, &mut Cli::command());
            Ok(())
        }
    }
}
