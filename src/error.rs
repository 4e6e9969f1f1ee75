//! Error types for the mirror task.

use std::fmt;
use std::path::PathBuf;

/// A URI that is absent or not an absolute URI with scheme and authority.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Provided URI '{}' is not a valid URI", display_uri(.uri))]
pub struct InvalidUriError {
    /// The offending value, `None` when no URI was supplied at all.
    pub uri: Option<String>,
}

impl InvalidUriError {
    pub fn new(uri: Option<&str>) -> Self {
        Self {
            uri: uri.map(str::to_string),
        }
    }
}

fn display_uri(uri: &Option<String>) -> &str {
    uri.as_deref().unwrap_or("undefined")
}

/// The git invocation a process error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Clone,
    Push,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Clone => f.write_str("clone"),
            Phase::Push => f.write_str("push"),
        }
    }
}

/// Coarse classification of a [`MirrorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required input is missing or malformed.
    Configuration,
    /// The git executable could not be resolved.
    ToolNotFound,
    /// Clone or push exited non-zero.
    ProcessExit,
    /// The git process could not be started.
    ProcessInvocation,
    /// Reading or rewriting packed-refs failed.
    RefFileIo,
}

/// Errors that end a mirror run. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    #[error(transparent)]
    InvalidUri(#[from] InvalidUriError),

    #[error("{0} must be defined")]
    MissingInput(&'static str),

    #[error("{name} must be a boolean, got '{value}'")]
    InvalidInput { name: &'static str, value: String },

    #[error(
        "Unable to locate executable file: '{tool}'. Please verify either the file path exists \
         or the file can be found within a directory specified by the PATH environment variable."
    )]
    ToolNotFound { tool: String },

    #[error(
        "An error occurred when attempting to clone the source repository. \
         Please check output for more details."
    )]
    CloneFailed { exit_code: i32 },

    #[error(
        "An error occurred when attempting to push to the destination repository. \
         Please check output for more details."
    )]
    PushFailed { exit_code: i32 },

    #[error("failed to start git {phase}: {source}")]
    Invocation {
        phase: Phase,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to {action} {}: {source}", .path.display())]
    RefFile {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MirrorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUri(_) | Self::MissingInput(_) | Self::InvalidInput { .. } => {
                ErrorKind::Configuration
            }
            Self::ToolNotFound { .. } => ErrorKind::ToolNotFound,
            Self::CloneFailed { .. } | Self::PushFailed { .. } => ErrorKind::ProcessExit,
            Self::Invocation { .. } => ErrorKind::ProcessInvocation,
            Self::RefFile { .. } => ErrorKind::RefFileIo,
        }
    }

    pub(crate) fn ref_file(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::RefFile {
            action,
            path: path.into(),
            source,
        }
    }
}
