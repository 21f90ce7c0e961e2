#![forbid(unsafe_code)]

mod cmd;
mod inputs;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::{OutputMode, resolve_output_mode};
use std::env;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "depsort: dependency-ordered planning for Python modules",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project root that qualified module names are derived from.
    /// Defaults to the current directory.
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags and environment.
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Planning",
        about = "Print the processing order",
        long_about = "Print modules in an order where every module comes after the modules it \
                      depends on. Modules removed to break cycles are reported separately.",
        after_help = "EXAMPLES:\n    # Order every module under the current directory\n    depsort order\n\n    # Order one package of another project\n    depsort --root ../svc order ../svc/api\n\n    # Emit machine-readable output\n    depsort order --format json"
    )]
    Order(cmd::order::OrderArgs),

    #[command(
        next_help_heading = "Planning",
        about = "Show the module dependency graph",
        long_about = "Show the dependency graph as an adjacency list, as Graphviz DOT, or as \
                      prerequisite/dependent trees for one module.",
        after_help = "EXAMPLES:\n    # Adjacency list\n    depsort graph\n\n    # Render with graphviz\n    depsort graph --dot | dot -Tsvg > deps.svg\n\n    # What does pkg.app need first?\n    depsort graph --focus pkg.app --up"
    )]
    Graph(cmd::graph::GraphArgs),

    #[command(
        next_help_heading = "Planning",
        about = "List dependency cycles",
        long_about = "List strongly connected components of the dependency graph and the modules \
                      removed to break them.",
        after_help = "EXAMPLES:\n    # List cycles\n    depsort cycles\n\n    # Emit machine-readable output\n    depsort cycles --json"
    )]
    Cycles(cmd::cycles::CyclesArgs),

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Generate shell completion scripts",
        long_about = "Generate shell completion scripts for supported shells.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    depsort completions bash\n\n    # Generate zsh completions\n    depsort completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("DEPSORT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "depsort=debug,info"
        } else {
            "depsort=info,warn"
        })
    });

    let format = env::var("DEPSORT_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

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

    let output = cli.output_mode();
    let project_root = match cli.root {
        Some(ref root) => root.clone(),
        None => env::current_dir()?,
    };
    debug!(root = %project_root.display(), ?output, "starting");

    match cli.command {
        Commands::Order(ref args) => cmd::order::run_order(args, output, &project_root),
        Commands::Graph(ref args) => cmd::graph::run_graph(args, output, &project_root),
        Commands::Cycles(ref args) => cmd::cycles::run_cycles(args, output, &project_root),
        Commands::Completions(ref args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}
