use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn inspect_defaults_to_tree_viz() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("doc.md");
    fs::write(&input, "```js\nlet x;\n```\n").unwrap();

    cargo_bin_cmd!("prosemd")
        .arg("inspect")
        .arg(&input)
        .assert()
        .success()
        .stdout("doc\n  code_block language=\"js\"\n    text \"let x;\"\n");
}

#[test]
fn inspect_token_simple() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("doc.md");
    fs::write(&input, "> quoted\n").unwrap();

    cargo_bin_cmd!("prosemd")
        .arg("inspect")
        .arg(&input)
        .arg("token-simple")
        .assert()
        .success()
        .stdout(
            predicate::str::starts_with("blockquote_open blockquote >")
                .and(predicate::str::contains("  paragraph_open p"))
                .and(predicate::str::contains("blockquote_close")),
        );
}

#[test]
fn inspect_rejects_unknown_transforms() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("doc.md");
    fs::write(&input, "x").unwrap();

    cargo_bin_cmd!("prosemd")
        .arg("inspect")
        .arg(&input)
        .arg("ast-tag")
        .assert()
        .failure();
}

#[test]
fn list_transforms_names_formats() {
    cargo_bin_cmd!("prosemd")
        .arg("--list-transforms")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("token-simple")
                .and(predicate::str::contains("tree-viz"))
                .and(predicate::str::contains("  markdown\n")),
        );
}

#[test]
fn check_accepts_the_fixture() {
    let input = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../prosemd-core/tests/markdown/fixtures/kitchensink.md");

    cargo_bin_cmd!("prosemd")
        .arg("check")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::ends_with(": ok\n"));
}

#[test]
fn check_reports_missing_files() {
    cargo_bin_cmd!("prosemd")
        .arg("check")
        .arg("/nonexistent/doc.md")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error reading file"));
}
