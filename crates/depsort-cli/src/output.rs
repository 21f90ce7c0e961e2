//! Output layer shared by the planning commands.
//!
//! Each command builds a [`Report`] payload (order, graph, cycles, focus)
//! and hands it to [`emit`], which picks the JSON, text or pretty form.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--format`, then the hidden `--json` flag
//! 2. `FORMAT` env var (`pretty`, `text` or `json`, any case)
//! 3. [`OutputMode::Pretty`] when stdout is a terminal, [`OutputMode::Text`] when piped

use clap::ValueEnum;
use depsort_core::error::{ErrorCode, PlanError};
use serde::Serialize;
use std::io::{self, IsTerminal, Write};

/// Width of the rule under pretty section headings.
pub const PRETTY_RULE_WIDTH: usize = 72;

/// Write a section heading underlined with a rule.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Write an aligned `key: value` line.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

/// How command results are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Headings, numbering and cycle annotations for a terminal.
    Pretty,
    /// One record per line for pipes and shell scripts.
    Text,
    /// The report payload as JSON.
    Json,
}

impl OutputMode {
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }

    /// Parse a `FORMAT` value. Unknown values yield `None`.
    fn from_env_value(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value.trim(), true).ok()
    }

    fn pick(
        format_flag: Option<Self>,
        json_flag: bool,
        format_env: Option<&str>,
        stdout_is_tty: bool,
    ) -> Self {
        format_flag
            .or_else(|| json_flag.then_some(Self::Json))
            .or_else(|| format_env.and_then(Self::from_env_value))
            .unwrap_or(if stdout_is_tty { Self::Pretty } else { Self::Text })
    }
}

/// Resolve the output mode from CLI flags, `FORMAT` and the terminal.
pub fn resolve_output_mode(format_flag: Option<OutputMode>, json_flag: bool) -> OutputMode {
    let format_env = std::env::var("FORMAT").ok();
    OutputMode::pick(
        format_flag,
        json_flag,
        format_env.as_deref(),
        io::stdout().is_terminal(),
    )
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// A command result that can be written in every [`OutputMode`].
///
/// JSON output is the serialized payload; the two human forms are written
/// by the implementor.
pub trait Report: Serialize {
    /// Compact form for scripts.
    fn write_text(&self, w: &mut dyn Write) -> io::Result<()>;

    /// Form for a terminal. Falls back to the text form.
    fn write_pretty(&self, w: &mut dyn Write) -> io::Result<()> {
        self.write_text(w)
    }
}

/// Write `report` to stdout in `mode`.
pub fn emit<R: Report>(mode: OutputMode, report: &R) -> anyhow::Result<()> {
    let stdout = io::stdout();
    write_report(mode, report, &mut stdout.lock())?;
    Ok(())
}

fn write_report<R: Report>(mode: OutputMode, report: &R, out: &mut dyn Write) -> io::Result<()> {
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut *out, report)?;
            writeln!(out)
        }
        OutputMode::Text => report.write_text(out),
        OutputMode::Pretty => report.write_pretty(out),
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A fatal error as shown to the user, with its code and remediation hint.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Stable `E####` code from [`ErrorCode`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
        }
    }

    /// An error tagged with `code` and its hint.
    pub fn with_code(message: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            message: message.into(),
            suggestion: code.hint().map(str::to_string),
            error_code: Some(code.code().to_string()),
        }
    }
}

impl From<&PlanError> for CliError {
    fn from(err: &PlanError) -> Self {
        Self::with_code(err.to_string(), err.code())
    }
}

/// Write `error` to stderr in `mode`.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    write_error(mode, error, &mut stderr.lock())?;
    Ok(())
}

fn write_error(mode: OutputMode, error: &CliError, out: &mut dyn Write) -> io::Result<()> {
    if mode.is_json() {
        serde_json::to_writer_pretty(&mut *out, &serde_json::json!({ "error": error }))?;
        return writeln!(out);
    }

    let tag = error
        .error_code
        .as_deref()
        .map_or_else(|| "error".to_string(), |code| format!("error[{code}]"));
    writeln!(out, "{tag}: {}", error.message)?;
    if let Some(suggestion) = &error.suggestion {
        writeln!(out, "  suggestion: {suggestion}")?;
    }
    Ok(())
}
