use super::eol::LineEnding;
use super::errors::PatchError;
use super::pending_matches;
use crate::edit::Edit;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One literal substitution in a rename map.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Rename {
    pub from: String,
    pub to: String,
}

impl Rename {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl<A: Into<String>, B: Into<String>> From<(A, B)> for Rename {
    fn from((from, to): (A, B)) -> Self {
        Rename::new(from, to)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("rename {shorter:?} (#{shorter_index}) runs before {longer:?} (#{longer_index}), which contains it")]
pub struct RenameOrderError {
    pub shorter: String,
    pub shorter_index: usize,
    pub longer: String,
    pub longer_index: usize,
}

/// Apply `renames` in order, each replacing every occurrence of its key.
///
/// Later entries see the output of earlier ones. Callers order keys so that
/// a key precedes any shorter key it contains; [`check_rename_order`]
/// reports violations.
pub fn apply_rename_map(content: &str, renames: &[Rename]) -> String {
    let mut current = content.to_string();
    for rename in renames {
        match replace_all(&current, &rename.from, &rename.to) {
            Ok((next, count)) => {
                if count > 0 {
                    tracing::debug!(from = %rename.from, count, "rename applied");
                }
                current = next;
            }
            // Spans come from match_indices on the same text
            Err(err) => tracing::warn!(from = %rename.from, %err, "rename skipped"),
        }
    }
    current
}

/// Replace all occurrences of `search` with `text`.
///
/// A multi-line `text` takes the file's dominant line ending. Occurrences of
/// `search` inside an already inserted `text` are left alone. When `search`
/// is absent and `text` is present the rule counts as applied and the
/// content comes back unchanged. Absent both, the search text is reported as
/// not found.
pub fn replace_literal(content: &str, search: &str, text: &str) -> Result<String, PatchError> {
    let text = LineEnding::detect(content)
        .unwrap_or(LineEnding::Lf)
        .apply(text);

    let edits: Vec<Edit> = pending_matches(content, search, &text)
        .into_iter()
        .map(|idx| Edit::new(idx, idx + search.len(), text.as_str(), search))
        .collect();

    if edits.is_empty() {
        if !text.is_empty() && content.contains(text.as_str()) {
            tracing::debug!("literal absent, replacement already present");
            return Ok(content.to_string());
        }
        return Err(PatchError::not_found(search, None));
    }

    let count = edits.len();
    let out = Edit::apply_all(content, edits)?;
    tracing::debug!(count, "literal replaced");
    Ok(out)
}

/// Verify no key is shadowed by an earlier key it contains.
pub fn check_rename_order(renames: &[Rename]) -> Result<(), RenameOrderError> {
    for (i, earlier) in renames.iter().enumerate() {
        for (j, later) in renames.iter().enumerate().skip(i + 1) {
            if later.from.len() > earlier.from.len() && later.from.contains(&earlier.from) {
                return Err(RenameOrderError {
                    shorter: earlier.from.clone(),
                    shorter_index: i,
                    longer: later.from.clone(),
                    longer_index: j,
                });
            }
        }
    }
    Ok(())
}

fn replace_all(content: &str, search: &str, text: &str) -> Result<(String, usize), PatchError> {
    if search.is_empty() {
        return Ok((content.to_string(), 0));
    }
    let edits: Vec<Edit> = content
        .match_indices(search)
        .map(|(idx, found)| Edit::new(idx, idx + found.len(), text, found))
        .collect();
    let count = edits.len();
    Ok((Edit::apply_all(content, edits)?, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> Vec<Rename> {
        pairs.iter().map(|&p| Rename::from(p)).collect()
    }

    #[test]
    fn test_longer_key_first_prevents_partial_rename() {
        let renames = map(&[("Community Tax", "X"), ("Community", "Y")]);
        assert_eq!(apply_rename_map("Community Tax Co", &renames), "X Co");
    }

    #[test]
    fn test_shorter_key_first_corrupts() {
        let renames = map(&[("Community", "Y"), ("Community Tax", "X")]);
        assert_eq!(apply_rename_map("Community Tax Co", &renames), "Y Tax Co");
        assert!(check_rename_order(&renames).is_err());
    }

    #[test]
    fn test_replaces_every_occurrence() {
        let renames = map(&[("ChiCayo Tax", "Community Tax"), ("ChiCayo", "Community Tax")]);
        let input = "ChiCayo Tax | Welcome to ChiCayo! | ChiCayo Tax";
        assert_eq!(
            apply_rename_map(input, &renames),
            "Community Tax | Welcome to Community Tax! | Community Tax"
        );
    }

    #[test]
    fn test_absent_keys_are_noop() {
        let renames = map(&[("nope", "x")]);
        assert_eq!(apply_rename_map("unchanged", &renames), "unchanged");
    }

    #[test]
    fn test_check_rename_order_accepts_specific_first() {
        let renames = map(&[
            ("ChiCayo Tax", "Community Tax"),
            ("ChiCayo", "Community Tax"),
            ("chicayotax", "communitytax"),
        ]);
        assert!(check_rename_order(&renames).is_ok());
    }

    #[test]
    fn test_check_rename_order_reports_pair() {
        let err = check_rename_order(&map(&[("a", "1"), ("b", "2"), ("ab", "3")])).unwrap_err();
        assert_eq!(err.shorter_index, 0);
        assert_eq!(err.longer_index, 2);
    }

    #[test]
    fn test_replace_literal_routing() {
        let content = "{currentView === 'training' ? <TrainingView /> : null}";
        let out = replace_literal(
            content,
            "currentView === 'training' ? <TrainingView />",
            "currentView === 'education' ? <EducationCenter />",
        )
        .unwrap();
        assert_eq!(
            out,
            "{currentView === 'education' ? <EducationCenter /> : null}"
        );
    }

    #[test]
    fn test_replace_literal_detects_applied() {
        let out = replace_literal("new text", "old text", "new text").unwrap();
        assert_eq!(out, "new text");
        assert!(matches!(
            replace_literal("other", "old text", "new text"),
            Err(PatchError::PatternNotFound { .. })
        ));
    }

    #[test]
    fn test_replace_literal_adopts_crlf() {
        let content = "<App />\r\n</main>\r\n";
        let out = replace_literal(content, "<App />", "<App />\n<Toaster />").unwrap();
        assert_eq!(out, "<App />\r\n<Toaster />\r\n</main>\r\n");
        assert_eq!(
            replace_literal(&out, "<App />", "<App />\n<Toaster />").unwrap(),
            out
        );
    }

    #[test]
    fn test_replace_literal_extending_search_is_idempotent() {
        let once = replace_literal("<App />", "<App />", "<App />\n<Toaster />").unwrap();
        let twice = replace_literal(&once, "<App />", "<App />\n<Toaster />").unwrap();
        assert_eq!(once, "<App />\n<Toaster />");
        assert_eq!(once, twice);
    }
}
