use std::fmt;
use std::io;
use std::path::PathBuf;

/// Machine-readable error codes for callers that branch on failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidRoot,
    ConfigParseError,
    NameCollision,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidRoot => "E1001",
            Self::ConfigParseError => "E1002",
            Self::NameCollision => "E2001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidRoot => "Project root is not a readable directory",
            Self::ConfigParseError => "Config file parse error",
            Self::NameCollision => "Two source files map to the same module name",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InvalidRoot => Some("Pass an existing directory with `--root`."),
            Self::ConfigParseError => Some("Fix syntax in .depsort/config.toml and retry."),
            Self::NameCollision => {
                Some("Rename one of the files or exclude it from the input paths.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Fatal planning failures.
///
/// Per-module problems (unreadable or unparseable sources, unresolvable
/// imports, cycles) never surface here; they are logged and absorbed.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// Two distinct admitted paths derive the same qualified name.
    #[error("module name `{name}` is claimed by both {} and {}", first.display(), second.display())]
    NameCollision {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// The project root could not be inspected.
    #[error("invalid project root {}: {source}", root.display())]
    InvalidRoot {
        root: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PlanError {
    /// The stable error code for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NameCollision { .. } => ErrorCode::NameCollision,
            Self::InvalidRoot { .. } => ErrorCode::InvalidRoot,
        }
    }
}
