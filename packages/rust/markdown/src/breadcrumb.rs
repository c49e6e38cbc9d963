//! Parent-folder trail for documents that lose their nesting when flattened.

use std::path::{Component, Path};

/// Label that starts the breadcrumb line.
const LABEL: &str = "**Parent:**";

/// Separator between breadcrumb segments.
const SEPARATOR: &str = " > ";

/// Ancestor folder names of a document, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Breadcrumb {
    segments: Vec<String>,
}

impl Breadcrumb {
    /// Build from a parent path relative to the export root.
    ///
    /// Empty, `.` and `..` components are dropped.
    pub fn from_relative_dir(rel: &Path) -> Self {
        let segments = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect();
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// `**Parent:** [[A]] > [[B]]`, or `None` at the export root.
    pub fn render(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let trail = self
            .segments
            .iter()
            .map(|s| format!("[[{s}]]"))
            .collect::<Vec<_>>()
            .join(SEPARATOR);
        Some(format!("{LABEL} {trail}"))
    }
}

/// Prepend the breadcrumb line and a blank line to `text`.
/// Must run after [`crate::rewrite_links`].
pub fn inject_breadcrumb(text: &str, relative_parent: &Path) -> String {
    match Breadcrumb::from_relative_dir(relative_parent).render() {
        Some(line) => format!("{line}\n\n{text}"),
        None => text.to_string(),
    }
}
