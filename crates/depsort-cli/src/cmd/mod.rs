pub mod completions;
pub mod cycles;
pub mod graph;
pub mod order;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use depsort_core::{ErrorCode, Plan, load_config, plan};

use crate::inputs::{SourceFilter, collect_inputs};
use crate::output::{CliError, OutputMode, render_error};

/// Input selection shared by every planning subcommand.
#[derive(Args, Debug, Default, Clone)]
pub struct InputArgs {
    /// Files or directories to plan. Defaults to the whole project root.
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,
}

/// Load the project config, collect inputs and run the planner.
///
/// Fatal errors are rendered in `output` mode before being returned.
pub fn load_plan(project_root: &Path, inputs: &InputArgs, output: OutputMode) -> anyhow::Result<Plan> {
    let root = std::path::absolute(project_root)
        .with_context(|| format!("Failed to resolve project root {}", project_root.display()))?;

    let (config, filter) = match load_config(&root)
        .and_then(|config| SourceFilter::from_config(&root, &config).map(|f| (config, f)))
    {
        Ok(loaded) => loaded,
        Err(err) => {
            render_error(
                output,
                &CliError::with_code(format!("{err:#}"), ErrorCode::ConfigParseError),
            )?;
            return Err(err);
        }
    };

    let paths = collect_inputs(&root, &inputs.paths, &filter)?;

    plan(&root, &paths, &config).or_else(|err| {
        render_error(output, &CliError::from(&err))?;
        Err(err.into())
    })
}

/// Qualified name for `path`, falling back to its display form.
pub fn display_name(plan: &Plan, path: &Path) -> String {
    plan.qualified_name(path)
        .map_or_else(|| path.display().to_string(), str::to_string)
}
