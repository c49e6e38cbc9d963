//! Markdown text passes for flattening an export into a single vault folder.
//!
//! Each pass takes text and returns text. [`transform`] runs them in order:
//! 1. [`strip_frontmatter`] drops the leading `---` metadata block
//! 2. [`rewrite_links`] turns links to `.md` files into `[[wikilinks]]`
//! 3. [`inject_breadcrumb`] prepends the original parent folders

mod breadcrumb;
mod frontmatter;
mod links;

use tracing::{instrument, trace};

use vaultflat_shared::{Document, FlattenOptions};

pub use breadcrumb::{Breadcrumb, inject_breadcrumb};
pub use frontmatter::strip_frontmatter;
pub use links::{Link, rewrite_links};

/// Options for [`transform`].
#[derive(Debug, Clone)]
pub struct TransformOptions {
    /// Prepend the `**Parent:**` line for nested documents.
    pub breadcrumbs: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self { breadcrumbs: true }
    }
}

impl From<&FlattenOptions> for TransformOptions {
    fn from(opts: &FlattenOptions) -> Self {
        Self {
            breadcrumbs: opts.breadcrumbs,
        }
    }
}

/// Run the full text pipeline on one document.
#[instrument(
    skip_all,
    fields(path = %doc.relative_path.display(), source = %doc.source_path.display())
)]
pub fn transform(doc: &Document, opts: &TransformOptions) -> String {
    let body = strip_frontmatter(&doc.content);
    trace!(
        stripped = doc.content.len() - body.len(),
        "frontmatter pass complete"
    );

    let body = rewrite_links(body);

    if opts.breadcrumbs {
        inject_breadcrumb(&body, doc.relative_parent())
    } else {
        body
    }
}
