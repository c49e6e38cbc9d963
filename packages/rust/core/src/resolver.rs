//! Output filename sanitizing and collision avoidance for the flat output folder.

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use vaultflat_shared::{Result, VaultflatError};

/// Used when sanitizing leaves nothing behind.
const FALLBACK_NAME: &str = "Untitled";

/// Hands out unique file names within one destination directory.
///
/// The claimed set belongs to the resolver, so every run (and every test) gets its own.
/// Names are compared case-insensitively: `Note.md` and `note.md` are the same file on
/// macOS and Windows.
#[derive(Debug, Default, Clone)]
pub struct FilenameResolver {
    claimed: HashSet<String>,
}

impl FilenameResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with every entry currently in `dir` taken.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(dir).map_err(|e| VaultflatError::io(dir, e))?;

        let mut resolver = Self::new();
        for entry in entries {
            let entry = entry.map_err(|e| VaultflatError::io(dir, e))?;
            resolver.claim(&entry.file_name().to_string_lossy());
        }

        debug!(
            dir = %dir.display(),
            existing = resolver.claimed.len(),
            "seeded filename resolver"
        );
        Ok(resolver)
    }

    /// Mark `name` as taken. Returns `false` if it already was.
    pub fn claim(&mut self, name: &str) -> bool {
        self.claimed.insert(key(name))
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }

    /// Sanitize `desired` and return the first free name, claiming it.
    ///
    /// `Note.md` → `Note.md`, then `Note-1.md`, `Note-2.md`, ...
    pub fn resolve(&mut self, desired: &str) -> String {
        let name = sanitize_filename(desired);
        if self.claim(&name) {
            return name;
        }

        let (stem, ext) = split_extension(&name);
        let mut counter: usize = 1;
        loop {
            let candidate = format!("{stem}-{counter}{ext}");
            if self.claim(&candidate) {
                debug!(desired = %name, resolved = %candidate, "resolved filename collision");
                return candidate;
            }
            counter += 1;
        }
    }
}

fn key(name: &str) -> String {
    name.to_lowercase()
}

/// Make `name` safe as a single file name.
///
/// Trims surrounding whitespace, turns `/` and `\` into `-`, and drops ASCII control
/// characters.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .replace(['/', '\\'], "-")
        .chars()
        .filter(|c| !c.is_ascii_control())
        .collect();

    if cleaned.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        cleaned
    }
}

/// Split at the last dot, ignoring leading dots: `a.tar.gz` → (`a.tar`, `.gz`),
/// `.env` → (`.env`, ``).
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if name[..idx].chars().any(|c| c != '.') => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    }
}
