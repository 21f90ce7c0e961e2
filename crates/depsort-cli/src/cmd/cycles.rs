//! `depsort cycles`: list dependency cycles and how they were broken.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use depsort_core::Plan;
use depsort_core::graph::find_all_cycles;
use serde::Serialize;

use crate::cmd::{InputArgs, display_name, load_plan};
use crate::cmd::order::closed_loop;
use crate::output::{OutputMode, Report, emit};

/// Arguments for `depsort cycles`.
#[derive(Args, Debug, Default)]
pub struct CyclesArgs {
    #[command(flatten)]
    pub inputs: InputArgs,
}

#[derive(Debug, Serialize)]
struct BreakEntry {
    removed: String,
    path: PathBuf,
    cycle: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CyclesOutput {
    /// Strongly connected components of the graph as built.
    cycles: Vec<Vec<String>>,
    /// Cycle breaks the sorter applied, in order.
    breaks: Vec<BreakEntry>,
}

impl CyclesOutput {
    fn from_plan(plan: &Plan) -> Self {
        let pet = plan.dependencies.to_petgraph(|p| display_name(plan, p));
        Self {
            cycles: find_all_cycles(&pet.graph),
            breaks: plan
                .breaks
                .iter()
                .map(|b| BreakEntry {
                    removed: display_name(plan, &b.removed),
                    path: b.removed.clone(),
                    cycle: b
                        .cycle
                        .members()
                        .iter()
                        .map(|p| display_name(plan, p))
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Execute `depsort cycles`.
pub fn run_cycles(args: &CyclesArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let plan = load_plan(project_root, &args.inputs, output)?;
    let payload = CyclesOutput::from_plan(&plan);
    emit(output, &payload)
}

impl Report for CyclesOutput {
    fn write_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        if self.cycles.is_empty() {
            return writeln!(w, "No dependency cycles found.");
        }

        writeln!(w, "Dependency cycles ({})", self.cycles.len())?;
        for (idx, cycle) in self.cycles.iter().enumerate() {
            writeln!(w, "\nCycle {}:", idx + 1)?;
            for module in cycle {
                writeln!(w, "  - {module}")?;
            }
        }

        if !self.breaks.is_empty() {
            writeln!(w, "\nRemoved from the order:")?;
            for entry in &self.breaks {
                writeln!(w, "  - {} (via {})", entry.removed, closed_loop(&entry.cycle))?;
            }
        }
        Ok(())
    }
}
