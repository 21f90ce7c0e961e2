//! `depsort graph`: dependency graph views.
//!
//! - `depsort graph`: adjacency list of every module
//! - `depsort graph --dot`: Graphviz DOT
//! - `depsort graph --focus NAME`: prerequisite / dependent trees of one module
//!
//! # Edge Direction
//!
//! The petgraph view points from prerequisite to dependent. A module's
//! *upstream* (`--up`) lists what must be processed first; its *downstream*
//! (`--down`) lists the modules waiting for it.

use std::collections::HashSet;
use std::fmt::Write as FmtWrite;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use depsort_core::Plan;
use depsort_core::graph::{DependencyGraph, PetGraph};
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use serde::Serialize;

use crate::cmd::{InputArgs, display_name, load_plan};
use crate::output::{CliError, OutputMode, Report, emit, pretty_section, render_error};

// ---------------------------------------------------------------------------
// Clap types
// ---------------------------------------------------------------------------

/// Arguments for `depsort graph`.
#[derive(Args, Debug, Default)]
pub struct GraphArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Print the graph in Graphviz DOT format.
    #[arg(long, conflicts_with = "focus")]
    pub dot: bool,

    /// Show the graph after cycle breaking instead of the graph as built.
    #[arg(long)]
    pub reduced: bool,

    /// Qualified module name to show prerequisite and dependent trees for.
    #[arg(long, value_name = "MODULE")]
    pub focus: Option<String>,

    /// Only show prerequisites of the focused module.
    #[arg(long, requires = "focus", conflicts_with = "down")]
    pub up: bool,

    /// Only show dependents of the focused module.
    #[arg(long, requires = "focus")]
    pub down: bool,

    /// Maximum tree depth (default: unlimited).
    #[arg(long, requires = "focus")]
    pub depth: Option<usize>,
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GraphNode {
    module: String,
    path: PathBuf,
    depends_on: Vec<String>,
}

#[derive(Debug, Serialize)]
struct GraphOutput {
    nodes: Vec<GraphNode>,
    edges: usize,
}

impl GraphOutput {
    fn from_graph(plan: &Plan, graph: &DependencyGraph) -> Self {
        let nodes = graph
            .iter()
            .map(|(path, deps)| GraphNode {
                module: display_name(plan, path),
                path: path.to_path_buf(),
                depends_on: deps.iter().map(|d| display_name(plan, d)).collect(),
            })
            .collect();
        Self {
            nodes,
            edges: graph.edge_count(),
        }
    }
}

#[derive(Debug, Serialize)]
struct FocusOutput {
    module: String,
    path: PathBuf,
    depends_on: Vec<String>,
    depended_on_by: Vec<String>,
    /// Rendered prerequisite/dependent trees for the human forms.
    #[serde(skip)]
    trees: String,
}

// ---------------------------------------------------------------------------
// ASCII tree rendering
// ---------------------------------------------------------------------------

/// Direct neighbours of `idx` in `direction`, sorted by label.
fn sorted_neighbors(pet: &PetGraph, idx: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
    let mut neighbors: Vec<NodeIndex> = pet.graph.neighbors_directed(idx, direction).collect();
    neighbors.sort_by(|a, b| pet.graph[*a].cmp(&pet.graph[*b]));
    neighbors.dedup();
    neighbors
}

/// Nodes seen so far while rendering one tree.
#[derive(Default)]
struct TreeVisit {
    /// Ancestors of the node being rendered.
    path: HashSet<NodeIndex>,
    /// Nodes whose subtree has already been printed.
    expanded: HashSet<NodeIndex>,
}

/// Render an ASCII tree rooted at `root` in the given direction.
///
/// - `Incoming` = upstream (what `root` depends on)
/// - `Outgoing` = downstream (what depends on `root`)
///
/// Each module's subtree is printed once. Later occurrences are marked
/// `[⟳ cycle]` when they close a loop and `[↑ above]` otherwise, so output
/// stays linear in the size of the graph.
fn render_tree(
    pet: &PetGraph,
    root: NodeIndex,
    direction: Direction,
    depth_limit: Option<usize>,
    out: &mut String,
) {
    let children = sorted_neighbors(pet, root, direction);
    if children.is_empty() {
        let _ = writeln!(out, "  (none)");
        return;
    }

    let mut visit = TreeVisit::default();
    visit.path.insert(root);
    render_tree_nodes(
        pet,
        &children,
        direction,
        depth_limit,
        0,
        &mut visit,
        "  ",
        out,
    );
}

#[allow(clippy::too_many_arguments)]
fn render_tree_nodes(
    pet: &PetGraph,
    nodes: &[NodeIndex],
    direction: Direction,
    depth_limit: Option<usize>,
    current_depth: usize,
    visit: &mut TreeVisit,
    prefix: &str,
    out: &mut String,
) {
    let count = nodes.len();
    for (i, &idx) in nodes.iter().enumerate() {
        let is_last = i + 1 == count;
        let connector = if is_last { "└── " } else { "├── " };
        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let label = &pet.graph[idx];

        if visit.path.contains(&idx) {
            let _ = writeln!(out, "{prefix}{connector}{label} [⟳ cycle]");
            continue;
        }
        if visit.expanded.contains(&idx) {
            let _ = writeln!(out, "{prefix}{connector}{label} [↑ above]");
            continue;
        }

        let _ = writeln!(out, "{prefix}{connector}{label}");

        let children = sorted_neighbors(pet, idx, direction);
        let at_limit = depth_limit.is_some_and(|d| current_depth + 1 >= d);
        if !at_limit {
            visit.path.insert(idx);
            render_tree_nodes(
                pet,
                &children,
                direction,
                depth_limit,
                current_depth + 1,
                visit,
                &child_prefix,
                out,
            );
            visit.path.remove(&idx);
            visit.expanded.insert(idx);
        } else if !children.is_empty() {
            let _ = writeln!(
                out,
                "{child_prefix}└── … {} more (use --depth to increase)",
                children.len()
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Command runner
// ---------------------------------------------------------------------------

/// Execute `depsort graph`.
pub fn run_graph(args: &GraphArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let plan = load_plan(project_root, &args.inputs, output)?;
    let graph = if args.reduced {
        &plan.reduced
    } else {
        &plan.dependencies
    };
    let pet = graph.to_petgraph(|p| display_name(&plan, p));

    if args.dot {
        print!("{}", pet.to_dot());
        return Ok(());
    }

    match &args.focus {
        Some(name) => run_graph_focus(&plan, &pet, name, args, output),
        None => {
            let payload = GraphOutput::from_graph(&plan, graph);
            emit(output, &payload)
        }
    }
}

fn run_graph_focus(
    plan: &Plan,
    pet: &PetGraph,
    name: &str,
    args: &GraphArgs,
    output: OutputMode,
) -> anyhow::Result<()> {
    let found = plan
        .modules
        .iter()
        .find(|(_, module)| module.as_str() == name)
        .and_then(|(path, _)| pet.node_map.get(path).map(|idx| (path, *idx)));
    let Some((path, idx)) = found else {
        let msg = format!("module not found: {name}");
        render_error(output, &CliError::new(&msg))?;
        anyhow::bail!("{msg}");
    };

    let show_up = !args.down;
    let show_down = !args.up;
    let names = |direction| -> Vec<String> {
        sorted_neighbors(pet, idx, direction)
            .into_iter()
            .map(|n| pet.graph[n].clone())
            .collect()
    };

    let mut trees = String::new();
    if !output.is_json() {
        if show_up {
            let _ = writeln!(trees, "\ndepends on (processed first):");
            render_tree(pet, idx, Direction::Incoming, args.depth, &mut trees);
        }
        if show_down {
            let _ = writeln!(trees, "\ndepended on by (processed after):");
            render_tree(pet, idx, Direction::Outgoing, args.depth, &mut trees);
        }
    }

    let payload = FocusOutput {
        module: name.to_string(),
        path: path.clone(),
        depends_on: if show_up { names(Direction::Incoming) } else { Vec::new() },
        depended_on_by: if show_down { names(Direction::Outgoing) } else { Vec::new() },
        trees,
    };
    emit(output, &payload)
}

impl Report for FocusOutput {
    fn write_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "{} ({})", self.module, self.path.display())?;
        w.write_all(self.trees.as_bytes())
    }
}

impl Report for GraphOutput {
    /// `module: dep dep ...`, one module per line.
    fn write_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        for node in &self.nodes {
            if node.depends_on.is_empty() {
                writeln!(w, "{}:", node.module)?;
            } else {
                writeln!(w, "{}: {}", node.module, node.depends_on.join(" "))?;
            }
        }
        Ok(())
    }

    fn write_pretty(&self, w: &mut dyn Write) -> std::io::Result<()> {
        pretty_section(
            w,
            &format!(
                "Module dependency graph ({} modules, {} edges)",
                self.nodes.len(),
                self.edges
            ),
        )?;
        for node in &self.nodes {
            writeln!(w, "{}  ({})", node.module, node.path.display())?;
            for dep in &node.depends_on {
                writeln!(w, "  → {dep}")?;
            }
        }
        if self.edges == 0 {
            writeln!(w, "\n  (no dependencies between modules)")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: GraphArgs,
    }

    fn label(p: &Path) -> String {
        p.display().to_string()
    }

    #[test]
    fn graph_args_defaults() {
        let w = Wrapper::parse_from(["test"]);
        assert!(w.args.inputs.paths.is_empty());
        assert!(!w.args.dot);
        assert!(!w.args.reduced);
        assert!(w.args.focus.is_none());
        assert!(w.args.depth.is_none());
    }

    #[test]
    fn graph_args_focus_and_flags() {
        let w = Wrapper::parse_from(["test", "src", "--focus", "pkg.app", "--down", "--depth", "2"]);
        assert_eq!(w.args.focus.as_deref(), Some("pkg.app"));
        assert!(w.args.down);
        assert!(!w.args.up);
        assert_eq!(w.args.depth, Some(2));
        assert_eq!(w.args.inputs.paths, vec![PathBuf::from("src")]);
    }

    #[test]
    fn direction_flags_require_focus() {
        assert!(Wrapper::try_parse_from(["test", "--up"]).is_err());
        assert!(Wrapper::try_parse_from(["test", "--focus", "a", "--up", "--down"]).is_err());
        assert!(Wrapper::try_parse_from(["test", "--focus", "a", "--dot"]).is_err());
    }

    #[test]
    fn render_tree_without_neighbors() {
        let graph = DependencyGraph::from_edges(["solo"], []);
        let pet = graph.to_petgraph(label);
        let mut out = String::new();
        render_tree(&pet, pet.node_map[Path::new("solo")], Direction::Incoming, None, &mut out);
        assert!(out.contains("(none)"));
    }

    #[test]
    fn render_tree_follows_prerequisites() {
        // app needs service, service needs models
        let graph = DependencyGraph::from_edges(
            ["app", "service", "models"],
            [("app", "service"), ("service", "models")],
        );
        let pet = graph.to_petgraph(label);
        let app = pet.node_map[Path::new("app")];

        let mut out = String::new();
        render_tree(&pet, app, Direction::Incoming, None, &mut out);
        assert!(out.contains("└── service"));
        assert!(out.contains("    └── models"));

        let mut limited = String::new();
        render_tree(&pet, app, Direction::Incoming, Some(1), &mut limited);
        assert!(limited.contains("└── service"));
        assert!(limited.contains("… 1 more"));
        assert!(!limited.contains("models"));
    }

    #[test]
    fn render_tree_marks_cycles() {
        let graph = DependencyGraph::from_edges(["a", "b"], [("a", "b"), ("b", "a")]);
        let pet = graph.to_petgraph(label);

        let mut out = String::new();
        render_tree(&pet, pet.node_map[Path::new("a")], Direction::Incoming, None, &mut out);
        assert!(out.contains("└── b"));
        assert!(out.contains("a [⟳ cycle]"));
    }

    #[test]
    fn render_tree_prints_each_shared_prerequisite_once() {
        // m{i} depends on every m{j} with j < i
        let names: Vec<String> = (0..24).map(|i| format!("m{i:02}")).collect();
        let edges: Vec<(String, String)> = names
            .iter()
            .enumerate()
            .flat_map(|(i, dependent)| {
                names[..i]
                    .iter()
                    .map(move |prerequisite| (dependent.clone(), prerequisite.clone()))
            })
            .collect();
        let graph = DependencyGraph::from_edges(names.clone(), edges);
        let pet = graph.to_petgraph(label);
        let top = pet.node_map[Path::new("m23")];

        let mut out = String::new();
        render_tree(&pet, top, Direction::Incoming, None, &mut out);

        let rows = out.lines().count();
        assert!(rows < 23 * 23, "tree grew to {rows} rows");
        assert_eq!(out.matches("m00\n").count(), 1, "m00 expanded once");
        assert!(out.contains("m00 [↑ above]"));
        assert!(!out.contains("[⟳ cycle]"));
    }

    #[test]
    fn text_rendering_lists_dependencies() {
        let payload = GraphOutput {
            nodes: vec![
                GraphNode {
                    module: "app".to_string(),
                    path: PathBuf::from("app.py"),
                    depends_on: vec!["lib".to_string(), "util".to_string()],
                },
                GraphNode {
                    module: "lib".to_string(),
                    path: PathBuf::from("lib.py"),
                    depends_on: Vec::new(),
                },
            ],
            edges: 2,
        };
        let mut out = Vec::new();
        payload.write_text(&mut out).expect("render");
        let rendered = String::from_utf8(out).expect("utf8");
        assert_eq!(rendered, "app: lib util\nlib:\n");
    }

    #[test]
    fn dot_output_uses_labels() {
        let graph = DependencyGraph::from_edges(["app", "lib"], [("app", "lib")]);
        let pet = graph.to_petgraph(label);
        let dot = pet.to_dot();
        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("label = \"app\""));
        assert!(dot.contains("label = \"lib\""));
        assert!(dot.contains("->"));
    }
}
