//! Leading metadata block removal.
//!
//! Only a `---` block anchored at the very start of the document counts.
//! A `---` pair further down the body is a thematic break, not metadata.

use std::sync::LazyLock;

use regex::Regex;

static FRONTMATTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    // opening line, optional body, closing line, then any blank lines after it
    Regex::new(
        r"(?s)\A\x{FEFF}?\s*---[ \t]*\r?\n(?:.*?\r?\n)??---[ \t]*(?:\r?\n(?:[ \t]*\r?\n)*|\z)",
    )
    .expect("valid regex")
});

/// Remove the frontmatter block at the start of `text`, returning the rest untouched.
///
/// Stacked blocks (`---\n..\n---\n---\n..\n---\n`) are all removed, so stripping an
/// already stripped document is a no-op. The cost: a body that opens with a thematic break
/// right after the metadata is indistinguishable from a second block, so everything up to
/// the next `---` line goes with it.
pub fn strip_frontmatter(text: &str) -> &str {
    let mut rest = text;
    while let Some(m) = FRONTMATTER_RE.find(rest) {
        rest = &rest[m.end()..];
    }
    rest
}
