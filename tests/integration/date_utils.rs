use super::{load_bundled, load_fixture, read, workspace_with};
use text_patcher::config::{apply_patches, ApplicationError, PatchResult};
use text_patcher::text::{replace_marker_span, PatchError, PatchRule};

const TARGET: &str = "utils/dateUtils.ts";

#[test]
fn date_utils_patch_matches_expected() {
    let config = load_bundled("date-utils.toml");
    let ws = workspace_with(&[(TARGET, &load_fixture("dateUtils.ts.input"))]);

    let outcomes = apply_patches(&config, ws.path());
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(outcomes[0].result, Ok(PatchResult::Applied { .. })));
    assert_eq!(read(ws.path(), TARGET), load_fixture("dateUtils.ts.expected"));
}

#[test]
fn date_utils_patch_is_idempotent() {
    let config = load_bundled("date-utils.toml");
    let ws = workspace_with(&[(TARGET, &load_fixture("dateUtils.ts.expected"))]);

    let outcomes = apply_patches(&config, ws.path());
    assert!(matches!(outcomes[0].result, Ok(PatchResult::Unchanged { .. })));
    assert_eq!(read(ws.path(), TARGET), load_fixture("dateUtils.ts.expected"));
}

#[test]
fn date_utils_patch_handles_crlf_checkout() {
    let config = load_bundled("date-utils.toml");
    let input = load_fixture("dateUtils.ts.input").replace('\n', "\r\n");
    let ws = workspace_with(&[(TARGET, &input)]);

    let _ = apply_patches(&config, ws.path());
    assert_eq!(
        read(ws.path(), TARGET),
        load_fixture("dateUtils.ts.expected").replace('\n', "\r\n")
    );
}

#[test]
fn date_utils_patch_reports_reindented_body() {
    let config = load_bundled("date-utils.toml");
    let input = load_fixture("dateUtils.ts.input").replace("  const now", "    const now");
    let ws = workspace_with(&[(TARGET, &input)]);

    let outcomes = apply_patches(&config, ws.path());
    match &outcomes[0].result {
        Err(ApplicationError::PatternNotFound {
            source: PatchError::PatternNotFound {
                near_miss: Some(nm),
                ..
            },
            ..
        }) => assert!(nm.whitespace_only),
        other => panic!("expected near miss, got {other:?}"),
    }
    assert_eq!(read(ws.path(), TARGET), input);
}

/// The first `};` after the signature closes the `if (days > 0)` return
/// object, not the function, so a marker span cannot replace this body whole.
#[test]
fn marker_span_stops_at_first_inner_delimiter() {
    let config = load_bundled("date-utils.toml");
    let PatchRule::ExactBlock { new, .. } = &config.patches[0].rule else {
        panic!("date-utils should be an exact-block patch");
    };

    let input = load_fixture("dateUtils.ts.input");
    let out = replace_marker_span(
        &input,
        "export const getRelativeTime = (isoString: string)",
        "};",
        new,
    )
    .unwrap();

    assert_ne!(out, load_fixture("dateUtils.ts.expected"));
    // The tail of the old body survives after the replacement
    assert_eq!(out.matches("if (hours > 0) return").count(), 2);
    assert_eq!(out.matches("export const getRelativeTime").count(), 1);
}
