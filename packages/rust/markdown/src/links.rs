//! Inline Markdown links to `.md` files become wikilinks.
//!
//! `[See](Other%20Page.md#Intro)` → `[[Other Page|See]]`
//! `[Other Page](../x/Other%20Page.md)` → `[[Other Page]]`

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Markdown file extension, compared case-insensitively.
const MD_EXT: &str = ".md";

static MD_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    // [display](target.md) or [display](target.md#anchor); lazy target so
    // each bracket/paren pair on a line is matched on its own
    Regex::new(r"(?i)\[([^\]]+)\]\(([^)]+?\.md(?:#[^)]*)?)\)").expect("valid regex")
});

/// An inline link pulled out of document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link<'a> {
    /// Text between the square brackets.
    pub display: &'a str,
    /// Raw target between the parentheses, possibly encoded, anchored, or path-qualified.
    pub target: &'a str,
}

impl<'a> Link<'a> {
    pub fn new(display: &'a str, target: &'a str) -> Self {
        Self { display, target }
    }

    /// Bare note name this link points at, or `None` when it is not a note link.
    pub fn note_name(&self) -> Option<String> {
        let target = self.target.trim();
        let without_anchor = target.split('#').next().unwrap_or_default();
        if !ends_with_ignore_case(without_anchor, MD_EXT) {
            return None;
        }

        let decoded = percent_decode(without_anchor);
        let file_name = decoded.rsplit('/').next().unwrap_or_default();
        let stem = strip_suffix_ignore_case(file_name, MD_EXT);
        let name = stem.replace('\\', "/");

        if name.is_empty() { None } else { Some(name) }
    }

    /// Wikilink form: `[[Name]]` when the display text already is the name,
    /// `[[Name|Display]]` otherwise.
    pub fn to_wikilink(&self) -> Option<String> {
        let name = self.note_name()?;
        let display = self.display.trim();
        if display.is_empty() || display == name {
            Some(format!("[[{name}]]"))
        } else {
            Some(format!("[[{name}|{display}]]"))
        }
    }
}

/// Rewrite every Markdown-file link in `text` into a wikilink.
///
/// Only the target's ending matters: `https://host/README.md` becomes `[[README|...]]` too.
/// Links to anything else (web pages, images, in-page anchors) are left as they are.
pub fn rewrite_links(text: &str) -> String {
    MD_LINK_RE
        .replace_all(text, |caps: &Captures| {
            let link = Link::new(&caps[1], &caps[2]);
            link.to_wikilink().unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Percent-decode, falling back to lossy UTF-8 like a lenient URL unquote.
fn percent_decode(s: &str) -> Cow<'_, str> {
    if !s.contains('%') {
        return Cow::Borrowed(s);
    }
    let bytes = urlencoding::decode_binary(s.as_bytes());
    Cow::Owned(String::from_utf8_lossy(&bytes).into_owned())
}

fn ends_with_ignore_case(s: &str, suffix: &str) -> bool {
    s.len() >= suffix.len()
        && s.is_char_boundary(s.len() - suffix.len())
        && s[s.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

fn strip_suffix_ignore_case<'s>(s: &'s str, suffix: &str) -> &'s str {
    if ends_with_ignore_case(s, suffix) {
        &s[..s.len() - suffix.len()]
    } else {
        s
    }
}
