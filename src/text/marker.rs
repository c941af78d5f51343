use super::eol::{normalize, LineEnding, Normalized};
use super::errors::PatchError;
use super::{line_of, pending_matches};
use crate::edit::Edit;

/// Delimiter used when a rule does not name one: the end of a block-bodied
/// `const` arrow function.
pub const DEFAULT_END_DELIMITER: &str = "};";

/// Replace `[marker, first delimiter after it]` with `replacement`.
///
/// The marker's first occurrence starts the span; the span ends just past the
/// first `end_delimiter` found at or after that point. A marker with no
/// following delimiter is an [`PatchError::UnboundedSpan`] and nothing is
/// replaced.
///
/// `"};"` is a lexical stand-in for "end of function". A delimiter that
/// occurs inside the region (a nested object literal, say) ends the span early.
pub fn replace_marker_span(
    content: &str,
    start_marker: &str,
    end_delimiter: &str,
    replacement: &str,
) -> Result<String, PatchError> {
    match locate_marker_span(content, start_marker, end_delimiter, replacement)? {
        Some(edit) => Ok(edit.apply_to(content)?),
        None => Ok(content.to_string()),
    }
}

/// Compute the edit for [`replace_marker_span`]; `None` when already applied.
pub fn locate_marker_span(
    content: &str,
    start_marker: &str,
    end_delimiter: &str,
    replacement: &str,
) -> Result<Option<Edit>, PatchError> {
    let view = Normalized::new(content);
    let marker = normalize(start_marker);
    let delimiter = normalize(end_delimiter);
    let wanted = normalize(replacement);

    // Markers inside an already applied replacement do not count
    let Some(&view_start) = pending_matches(&view.text, &marker, &wanted).first() else {
        if !wanted.is_empty() && view.text.contains(wanted.as_str()) {
            tracing::debug!("marker absent, replacement already present");
            return Ok(None);
        }
        return Err(PatchError::not_found(start_marker, None));
    };

    let Some(rel_end) = view.text[view_start..].find(delimiter.as_str()) else {
        return Err(PatchError::UnboundedSpan {
            marker: start_marker.to_string(),
            delimiter: end_delimiter.to_string(),
            line: line_of(&view.text, view_start),
        });
    };
    let (start, end) = view.original_range(view_start, view_start + rel_end + delimiter.len());

    let current = &content[start..end];
    let ending = LineEnding::detect(current)
        .or_else(|| LineEnding::detect(content))
        .unwrap_or(LineEnding::Lf);

    tracing::debug!(
        line = line_of(content, start),
        chars = current.chars().count(),
        "marker span located"
    );

    Ok(Some(Edit::new(start, end, ending.apply(replacement), current)))
}
