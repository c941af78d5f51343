//! Pure text transforms.
//!
//! Nothing here touches the filesystem; each operation takes the full file
//! text and returns the new text or a [`PatchError`].

pub mod block;
pub mod eol;
pub mod errors;
pub mod marker;
pub mod near_miss;
pub mod rename;

pub use block::{locate_exact_block, replace_exact_block};
pub use eol::{LineEnding, LineEndingPolicy};
pub use errors::PatchError;
pub use marker::{locate_marker_span, replace_marker_span, DEFAULT_END_DELIMITER};
pub use near_miss::NearMiss;
pub use rename::{apply_rename_map, check_rename_order, replace_literal, Rename, RenameOrderError};

use serde::Deserialize;

/// A locator plus its replacement.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PatchRule {
    /// Verbatim multi-line block, expected exactly once
    ExactBlock { old: String, new: String },
    /// From the first `start_marker` through the next `end_delimiter`
    MarkerSpan {
        start_marker: String,
        #[serde(default = "default_end_delimiter")]
        end_delimiter: String,
        text: String,
    },
    /// Ordered global substitutions
    Rename { renames: Vec<Rename> },
    /// Replace every occurrence of one literal
    Literal { search: String, text: String },
}

fn default_end_delimiter() -> String {
    DEFAULT_END_DELIMITER.to_string()
}

impl PatchRule {
    pub fn apply(&self, content: &str) -> Result<String, PatchError> {
        match self {
            PatchRule::ExactBlock { old, new } => replace_exact_block(content, old, new),
            PatchRule::MarkerSpan {
                start_marker,
                end_delimiter,
                text,
            } => replace_marker_span(content, start_marker, end_delimiter, text),
            PatchRule::Rename { renames } => Ok(apply_rename_map(content, renames)),
            PatchRule::Literal { search, text } => replace_literal(content, search, text),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PatchRule::ExactBlock { .. } => "exact-block",
            PatchRule::MarkerSpan { .. } => "marker-span",
            PatchRule::Rename { .. } => "rename",
            PatchRule::Literal { .. } => "literal",
        }
    }
}

/// Offsets of `needle` in `haystack` that still need replacing.
///
/// When `replacement` embeds `needle`, occurrences lying inside an applied
/// `replacement` are skipped.
pub(crate) fn pending_matches(haystack: &str, needle: &str, replacement: &str) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }
    let applied: Vec<(usize, usize)> = if !replacement.is_empty() && replacement.contains(needle) {
        haystack
            .match_indices(replacement)
            .map(|(idx, found)| (idx, idx + found.len()))
            .collect()
    } else {
        Vec::new()
    };
    haystack
        .match_indices(needle)
        .map(|(idx, _)| idx)
        .filter(|&idx| {
            !applied
                .iter()
                .any(|&(start, end)| idx >= start && idx + needle.len() <= end)
        })
        .collect()
}

/// 1-based line number of a byte offset.
pub(crate) fn line_of(text: &str, byte_offset: usize) -> usize {
    text[..byte_offset.min(text.len())].matches('\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_dispatch() {
        let rule = PatchRule::Literal {
            search: "a".into(),
            text: "b".into(),
        };
        assert_eq!(rule.apply("aXa").unwrap(), "bXb");
        assert_eq!(rule.kind(), "literal");
    }

    #[test]
    fn test_marker_span_default_delimiter() {
        let rule: PatchRule = toml_edit::de::from_str(
            r#"
type = "marker-span"
start_marker = "export const f"
text = "export const f = () => 1;"
"#,
        )
        .unwrap();
        match rule {
            PatchRule::MarkerSpan { end_delimiter, .. } => assert_eq!(end_delimiter, "};"),
            other => panic!("unexpected rule {other:?}"),
        }
    }

    #[test]
    fn test_pending_matches_skips_applied_copies() {
        let text = "<App />\n<Toaster />\n<App />\n";
        assert_eq!(pending_matches(text, "<App />", "<App />\n<Toaster />"), [20]);
        assert_eq!(pending_matches(text, "<App />", "<Root />"), [0, 20]);
        assert!(pending_matches(text, "", "x").is_empty());
    }

    #[test]
    fn test_line_of() {
        assert_eq!(line_of("a\nb\nc", 0), 1);
        assert_eq!(line_of("a\nb\nc", 2), 2);
        assert_eq!(line_of("a\nb\nc", 4), 3);
    }
}
