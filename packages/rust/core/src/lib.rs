//! Flatten orchestration for vaultflat.
//!
//! Walks an exported Markdown tree, runs every note through the
//! `vaultflat-markdown` passes, and writes the results into one folder with
//! collision-free names. Non-Markdown files are mirrored under an assets folder.

pub mod flatten;
pub mod resolver;

pub use flatten::{ProgressReporter, SilentProgress, flatten};
pub use resolver::{FilenameResolver, sanitize_filename};
