use super::{load_bundled, read, workspace_with};
use text_patcher::config::{apply_patches, ApplicationError, PatchResult};
use text_patcher::report::{Status, Summary, EXIT_OK};

#[test]
fn rebrand_targets_fourteen_files_in_order() {
    let config = load_bundled("rebrand.toml");
    let targets = config.patches[0].targets();
    assert_eq!(targets.len(), 14);
    assert_eq!(targets[0], "package.json");
    assert_eq!(targets[13], "components/Admin/IncentiveBuilder.tsx");
}

#[test]
fn rebrand_updates_present_files_and_reports_missing() {
    let config = load_bundled("rebrand.toml");
    let ws = workspace_with(&[
        ("package.json", "{\n  \"name\": \"chicayotax\"\n}\n"),
        ("electron.js", "    title: \"ChiCayo Tax\",\n"),
        (
            "components/TutorialOverlay.tsx",
            "      title: \"Welcome to ChiCayo!\",\n",
        ),
        (
            "components/Admin/IncentiveBuilder.tsx",
            "`You are the Achievement Engine for ChiCayo. Parse the admin's request.`\n",
        ),
        ("components/Sidebar.tsx", "<span>Community Tax</span>\n"),
    ]);

    let outcomes = apply_patches(&config, ws.path());
    assert_eq!(outcomes.len(), 14);

    assert_eq!(
        read(ws.path(), "package.json"),
        "{\n  \"name\": \"communitytax\"\n}\n"
    );
    assert_eq!(
        read(ws.path(), "electron.js"),
        "    title: \"Community Tax\",\n"
    );
    assert_eq!(
        read(ws.path(), "components/TutorialOverlay.tsx"),
        "      title: \"Welcome to Community Tax!\",\n"
    );
    assert!(read(ws.path(), "components/Admin/IncentiveBuilder.tsx")
        .contains("Achievement Engine for Community Tax."));

    let sidebar = outcomes
        .iter()
        .find(|o| o.file.ends_with("components/Sidebar.tsx"))
        .unwrap();
    assert!(matches!(sidebar.result, Ok(PatchResult::Unchanged { .. })));

    let missing: Vec<_> = outcomes
        .iter()
        .filter(|o| matches!(o.result, Err(ApplicationError::FileNotFound { .. })))
        .collect();
    assert_eq!(missing.len(), 9);

    let summary = Summary::from_outcomes(&outcomes);
    assert_eq!(summary.patched, 4);
    assert_eq!(summary.unchanged, 1);
    assert_eq!(summary.exit_code(), EXIT_OK);
    assert!(outcomes
        .iter()
        .all(|o| Status::of(&o.result) != Status::Error));
}
