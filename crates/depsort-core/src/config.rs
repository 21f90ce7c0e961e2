use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::extract::ExtractOptions;

/// Location of the optional project config, relative to the project root.
pub const CONFIG_PATH: &str = ".depsort/config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub modules: ModulesConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModulesConfig {
    /// File extensions (without the dot) admitted as source modules.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Directory names skipped when a directory is expanded into files.
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,
    /// Exact file names skipped when a directory is expanded.
    #[serde(default)]
    pub exclude_files: Vec<String>,
    /// Gitignore-style globs (`test_*.py`, `legacy/**`) skipped when a
    /// directory is expanded.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            exclude_dirs: default_exclude_dirs(),
            exclude_files: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_true")]
    pub bare_references: bool,
    #[serde(default = "default_true")]
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            bare_references: default_true(),
            parallel: default_true(),
        }
    }
}

impl Config {
    /// Extraction switches derived from the `[analysis]` table.
    #[must_use]
    pub const fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            bare_references: self.analysis.bare_references,
            parallel: self.analysis.parallel,
        }
    }
}

/// Load `<root>/.depsort/config.toml`, falling back to defaults when absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(project_root: &Path) -> Result<Config> {
    let path = project_root.join(CONFIG_PATH);
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<Config>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn default_extensions() -> Vec<String> {
    vec!["py".to_string()]
}

fn default_exclude_dirs() -> Vec<String> {
    ["build", "dist", "__pycache__", "venv", ".venv", "env", ".env"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

const fn default_true() -> bool {
    true
}
