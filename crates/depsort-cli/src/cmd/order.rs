//! `depsort order`: print the processing order.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use depsort_core::Plan;
use serde::Serialize;

use crate::cmd::{InputArgs, display_name, load_plan};
use crate::output::{OutputMode, Report, emit, pretty_kv, pretty_section};

/// Arguments for `depsort order`.
#[derive(Args, Debug, Default)]
pub struct OrderArgs {
    #[command(flatten)]
    pub inputs: InputArgs,
}

#[derive(Debug, Serialize)]
struct OrderEntry {
    module: String,
    path: PathBuf,
}

#[derive(Debug, Serialize)]
struct RemovedEntry {
    module: String,
    path: PathBuf,
    cycle: Vec<String>,
}

#[derive(Debug, Serialize)]
struct OrderOutput {
    root: PathBuf,
    order: Vec<OrderEntry>,
    removed: Vec<RemovedEntry>,
    skipped: usize,
}

impl OrderOutput {
    fn from_plan(plan: &Plan) -> Self {
        let entry = |path: &Path| OrderEntry {
            module: display_name(plan, path),
            path: path.to_path_buf(),
        };
        Self {
            root: plan.root.clone(),
            order: plan.order.iter().map(|p| entry(p)).collect(),
            removed: plan
                .breaks
                .iter()
                .map(|b| RemovedEntry {
                    module: display_name(plan, &b.removed),
                    path: b.removed.clone(),
                    cycle: b
                        .cycle
                        .members()
                        .iter()
                        .map(|p| display_name(plan, p))
                        .collect(),
                })
                .collect(),
            skipped: plan.skipped,
        }
    }
}

/// Execute `depsort order`.
pub fn run_order(args: &OrderArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let plan = load_plan(project_root, &args.inputs, output)?;
    let payload = OrderOutput::from_plan(&plan);
    emit(output, &payload)
}

impl Report for OrderOutput {
    /// One path per line, in order. Removed modules are left out.
    fn write_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        for entry in &self.order {
            writeln!(w, "{}", entry.path.display())?;
        }
        Ok(())
    }

    fn write_pretty(&self, w: &mut dyn Write) -> std::io::Result<()> {
        pretty_section(w, &format!("Processing order ({} modules)", self.order.len()))?;
        if self.order.is_empty() {
            writeln!(w, "  (no modules)")?;
        }
        let width = self.order.len().to_string().len();
        for (idx, entry) in self.order.iter().enumerate() {
            writeln!(
                w,
                "{:>width$}. {}  ({})",
                idx + 1,
                entry.module,
                entry.path.display()
            )?;
        }

        if !self.removed.is_empty() {
            writeln!(w)?;
            pretty_section(w, "Removed to break cycles")?;
            for entry in &self.removed {
                writeln!(w, "  ✗ {}  [{}]", entry.module, closed_loop(&entry.cycle))?;
            }
        }

        writeln!(w)?;
        pretty_kv(w, "root", self.root.display().to_string())?;
        pretty_kv(w, "skipped", self.skipped.to_string())
    }
}

/// `a → b → a` for the cycle `[a, b]`.
pub(crate) fn closed_loop(cycle: &[String]) -> String {
    cycle
        .iter()
        .chain(cycle.first())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" → ")
}
