//! Error types for vaultflat.
//!
//! Library crates use [`VaultflatError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

use serde::Serialize;

/// Top-level error type for all vaultflat operations.
#[derive(Debug, thiserror::Error)]
pub enum VaultflatError {
    /// A source file could not be read (permissions, encoding, I/O).
    #[error("cannot read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A destination file could not be written.
    #[error("cannot write {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An asset could not be duplicated into the assets folder.
    #[error("cannot copy asset {from:?} to {to:?}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    /// Filesystem I/O error outside of per-file processing.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Invalid input (bad export root, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, VaultflatError>;

/// The three non-fatal failure kinds a run can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ReadFailure,
    WriteFailure,
    CopyFailure,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::ReadFailure => "read failure",
            Self::WriteFailure => "write failure",
            Self::CopyFailure => "copy failure",
        };
        f.write_str(label)
    }
}

impl VaultflatError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub fn copy(from: impl Into<PathBuf>, to: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Copy {
            from: from.into(),
            to: to.into(),
            source,
        }
    }

    /// The non-fatal kind of this error, if it is one a run skips over.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Read { .. } => Some(FailureKind::ReadFailure),
            Self::Write { .. } => Some(FailureKind::WriteFailure),
            Self::Copy { .. } => Some(FailureKind::CopyFailure),
            _ => None,
        }
    }
}
