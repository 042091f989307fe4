use assert_cmd::Command;
use predicates::str::contains;
use std::fs;
use tempfile::tempdir;

#[test]
fn status_reports_layout_and_counts() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("docflow");
    let inbox = home.join("inbox");
    fs::create_dir_all(inbox.join("archive")).expect("mkdir inbox");
    fs::create_dir_all(home.join("output")).expect("mkdir output");
    fs::write(inbox.join("pending.txt"), "waiting").expect("write pending");
    fs::write(inbox.join("ignored.png"), [0u8]).expect("write non-document");
    fs::write(inbox.join("archive/done.txt"), "archived").expect("write archived");
    fs::write(home.join("output/done_processed.json"), "{}").expect("write artifact");

    Command::cargo_bin("docflow")
        .expect("docflow binary")
        .current_dir(tmp.path())
        .env("DOCFLOW_HOME", &home)
        .env("DOCFLOW_CONFIG_PATH", tmp.path().join("no-config.toml"))
        .arg("status")
        .assert()
        .success()
        .stdout(contains(format!("home={}", home.display())))
        .stdout(contains("pending=1"))
        .stdout(contains("processed=1"))
        .stdout(contains("archived=1"));
}

#[test]
fn status_works_before_any_layout_exists() {
    let tmp = tempdir().expect("tempdir");

    Command::cargo_bin("docflow")
        .expect("docflow binary")
        .current_dir(tmp.path())
        .env("DOCFLOW_HOME", tmp.path().join("missing"))
        .env("DOCFLOW_CONFIG_PATH", tmp.path().join("no-config.toml"))
        .arg("status")
        .assert()
        .success()
        .stdout(contains("pending=0"));
}
