use super::{load_bundled, load_fixture, read, workspace_with};
use text_patcher::config::{apply_patches, ApplicationError, PatchResult};
use text_patcher::report::{Summary, EXIT_NO_MATCH};

#[test]
fn routing_patch_swaps_view() {
    let config = load_bundled("routing.toml");
    let ws = workspace_with(&[("App.tsx", &load_fixture("App.tsx.input"))]);

    let outcomes = apply_patches(&config, ws.path());
    assert!(matches!(outcomes[0].result, Ok(PatchResult::Applied { .. })));
    assert_eq!(read(ws.path(), "App.tsx"), load_fixture("App.tsx.expected"));

    let again = apply_patches(&config, ws.path());
    assert!(matches!(again[0].result, Ok(PatchResult::Unchanged { .. })));
}

#[test]
fn routing_patch_without_target_line() {
    let config = load_bundled("routing.toml");
    let ws = workspace_with(&[("App.tsx", "export default () => null;\n")]);

    let outcomes = apply_patches(&config, ws.path());
    assert!(matches!(
        outcomes[0].result,
        Err(ApplicationError::PatternNotFound { .. })
    ));
    assert_eq!(Summary::from_outcomes(&outcomes).exit_code(), EXIT_NO_MATCH);
}
