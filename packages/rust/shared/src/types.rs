//! Core domain types for a flatten run.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{FailureKind, VaultflatError};

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A Markdown file read from the export tree.
///
/// Read once, pushed through the text pipeline, and dropped after the write.
#[derive(Debug, Clone)]
pub struct Document {
    /// Full text content as read from disk.
    pub content: String,
    /// Absolute (or caller-relative) path of the source file.
    pub source_path: PathBuf,
    /// Path of the file relative to the export root.
    pub relative_path: PathBuf,
}

impl Document {
    pub fn new(
        content: impl Into<String>,
        source_path: impl Into<PathBuf>,
        relative_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            content: content.into(),
            source_path: source_path.into(),
            relative_path: relative_path.into(),
        }
    }

    /// Parent directory relative to the export root (empty at the root).
    pub fn relative_parent(&self) -> &Path {
        self.relative_path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// The original file name, lossily converted to UTF-8.
    pub fn file_name(&self) -> String {
        self.relative_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// FlattenSummary
// ---------------------------------------------------------------------------

/// A file the run skipped, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub reason: String,
}

impl SkippedFile {
    /// Build a record from a per-file error. Returns `None` for fatal errors.
    pub fn from_error(err: &VaultflatError) -> Option<Self> {
        let kind = err.failure_kind()?;
        let (path, reason) = match err {
            VaultflatError::Read { path, source } | VaultflatError::Write { path, source } => {
                (path.clone(), source.to_string())
            }
            VaultflatError::Copy { from, source, .. } => (from.clone(), source.to_string()),
            _ => return None,
        };
        Some(Self { path, kind, reason })
    }
}

/// Totals reported at the end of a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FlattenSummary {
    /// Markdown files converted and written.
    pub markdown_converted: usize,
    /// Non-Markdown files duplicated into the assets folder.
    pub assets_copied: usize,
    /// Where assets went, when asset copying was enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets_root: Option<PathBuf>,
    /// Files skipped because of read, write, or copy failures.
    pub failures: Vec<SkippedFile>,
}

impl FlattenSummary {
    /// Record a per-file failure. Fatal errors are ignored here; callers propagate those.
    pub fn record_failure(&mut self, err: &VaultflatError) {
        if let Some(skipped) = SkippedFile::from_error(err) {
            self.failures.push(skipped);
        }
    }

    pub fn skipped(&self) -> usize {
        self.failures.len()
    }
}
