use super::eol::{normalize, LineEnding, Normalized};
use super::errors::PatchError;
use super::near_miss::find_near_miss;
use super::{line_of, pending_matches};
use crate::edit::Edit;

/// Replace the single occurrence of `old_block` in `content` with `new_block`.
///
/// Comparison happens with `\r\n` normalized to `\n` on both sides. The match
/// is mapped back onto the original text, so bytes outside the block are
/// preserved exactly and `new_block` takes the line ending of the span it
/// replaces.
///
/// If `old_block` is absent but `new_block` is already present the content is
/// returned unchanged; a second application is therefore a no-op.
pub fn replace_exact_block(
    content: &str,
    old_block: &str,
    new_block: &str,
) -> Result<String, PatchError> {
    let edit = locate_exact_block(content, old_block, new_block)?;
    match edit {
        Some(edit) => Ok(edit.apply_to(content)?),
        None => Ok(content.to_string()),
    }
}

/// Compute the edit for [`replace_exact_block`]; `None` when already applied.
pub fn locate_exact_block(
    content: &str,
    old_block: &str,
    new_block: &str,
) -> Result<Option<Edit>, PatchError> {
    let view = Normalized::new(content);
    let needle = normalize(old_block);
    let replacement = normalize(new_block);

    let start = match pending_matches(&view.text, &needle, &replacement).as_slice() {
        [] => {
            if view.text.contains(replacement.as_str()) {
                tracing::debug!("exact block absent, replacement already present");
                return Ok(None);
            }
            return Err(PatchError::not_found(
                old_block,
                find_near_miss(&view.text, &needle),
            ));
        }
        [start] => *start,
        [first, rest @ ..] => {
            return Err(PatchError::AmbiguousMatch {
                count: rest.len() + 1,
                first_line: line_of(&view.text, *first),
            });
        }
    };

    let (orig_start, orig_end) = view.original_range(start, start + needle.len());
    let current = &content[orig_start..orig_end];
    let ending = LineEnding::detect(current)
        .or_else(|| LineEnding::detect(content))
        .unwrap_or(LineEnding::Lf);

    tracing::debug!(
        line = line_of(content, orig_start),
        bytes = orig_end - orig_start,
        "exact block located"
    );

    Ok(Some(Edit::new(
        orig_start,
        orig_end,
        ending.apply(new_block),
        current,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const OLD: &str = "export const f = (s: string) => {\n  return s;\n};";
    const NEW: &str = "export const f = (s?: string) => {\n  return s ?? '';\n};";

    #[test]
    fn test_replaces_block_and_keeps_surroundings() {
        let content = format!("// header\n{OLD}\n// footer\n");
        let out = replace_exact_block(&content, OLD, NEW).unwrap();
        assert_eq!(out, format!("// header\n{NEW}\n// footer\n"));
    }

    #[test]
    fn test_second_application_is_noop() {
        let content = format!("a\n{OLD}\nb\n");
        let once = replace_exact_block(&content, OLD, NEW).unwrap();
        let twice = replace_exact_block(&once, OLD, NEW).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_block_reports_not_found() {
        let err = replace_exact_block("nothing here\n", OLD, NEW).unwrap_err();
        assert!(matches!(err, PatchError::PatternNotFound { .. }));
    }

    #[test]
    fn test_indentation_mismatch_fails_loudly() {
        let drifted = OLD.replace("  return", "    return");
        let err = replace_exact_block(&drifted, OLD, NEW).unwrap_err();
        match err {
            PatchError::PatternNotFound {
                near_miss: Some(nm),
                ..
            } => {
                assert_eq!(nm.line, 1);
                assert!(nm.whitespace_only);
            }
            other => panic!("expected near miss, got {other:?}"),
        }
    }

    #[test]
    fn test_replacement_wrapping_old_block_is_idempotent() {
        let wrapped = format!("// patched\n{OLD}");
        let once = replace_exact_block(&format!("{OLD}\n"), OLD, &wrapped).unwrap();
        let twice = replace_exact_block(&once, OLD, &wrapped).unwrap();
        assert_eq!(once, format!("{wrapped}\n"));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unpatched_copy_beside_patched_one_is_replaced() {
        let wrapped = format!("// patched\n{OLD}");
        let content = format!("{wrapped}\n\n{OLD}\n");
        let out = replace_exact_block(&content, OLD, &wrapped).unwrap();
        assert_eq!(out, format!("{wrapped}\n\n{wrapped}\n"));
        assert_eq!(replace_exact_block(&out, OLD, &wrapped).unwrap(), out);
    }

    #[test]
    fn test_duplicate_block_is_ambiguous() {
        let content = format!("{OLD}\n{OLD}\n");
        let err = replace_exact_block(&content, OLD, NEW).unwrap_err();
        assert_eq!(
            err,
            PatchError::AmbiguousMatch {
                count: 2,
                first_line: 1
            }
        );
    }

    #[test]
    fn test_crlf_file_matches_lf_block() {
        let content = format!("top\r\n{}\r\nbottom\r\n", OLD.replace('\n', "\r\n"));
        let out = replace_exact_block(&content, OLD, NEW).unwrap();
        assert_eq!(
            out,
            format!("top\r\n{}\r\nbottom\r\n", NEW.replace('\n', "\r\n"))
        );
    }

    #[test]
    fn test_mixed_endings_outside_block_untouched() {
        let content = format!("a\r\nb\n{OLD}\nc\r\n");
        let out = replace_exact_block(&content, OLD, NEW).unwrap();
        assert_eq!(out, format!("a\r\nb\n{NEW}\nc\r\n"));
    }

    #[test]
    fn test_multibyte_neighbours() {
        let content = format!("// caf\u{e9} \u{2615}\n{OLD}\n// \u{fc}ber\n");
        let out = replace_exact_block(&content, OLD, NEW).unwrap();
        assert_eq!(out, format!("// caf\u{e9} \u{2615}\n{NEW}\n// \u{fc}ber\n"));
    }

    proptest! {
        #[test]
        fn prop_unrelated_text_is_preserved(
            prefix in "[a-z \\n\u{e9}]{0,40}",
            suffix in "[a-z \\n\u{e9}]{0,40}",
        ) {
            let content = format!("{prefix}{OLD}{suffix}");
            let out = replace_exact_block(&content, OLD, NEW).unwrap();
            prop_assert_eq!(&out, &format!("{prefix}{NEW}{suffix}"));
            prop_assert_eq!(replace_exact_block(&out, OLD, NEW).unwrap(), out);
        }
    }
}
