use assert_cmd::Command;
use predicates::str::contains;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_fake_extractor(bin_path: &Path) {
    let script = r#"#!/usr/bin/env bash
set -euo pipefail

content=$(cat)
if [[ "$content" == *poison* ]]; then
  echo "simulated rate limit" >&2
  exit 1
fi

echo '{"vendor_name": "John Doe", "total_amount": 500}'
"#;
    fs::write(bin_path, script).expect("write fake extractor");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(bin_path).expect("metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(bin_path, perms).expect("chmod");
    }
}

fn docflow_cmd(tmp: &Path, home: &Path, extractor: &Path) -> Command {
    let mut cmd = Command::cargo_bin("docflow").expect("docflow binary");
    cmd.current_dir(tmp)
        .env("DOCFLOW_HOME", home)
        .env("DOCFLOW_CONFIG_PATH", tmp.join("no-config.toml"))
        .env("DOCFLOW_EXTRACT_PROVIDER", "command")
        .env("DOCFLOW_EXTRACT_CMD", extractor);
    cmd
}

#[test]
fn watch_once_processes_and_archives_an_invoice() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("docflow");
    let inbox = home.join("inbox");
    fs::create_dir_all(&inbox).expect("mkdir inbox");
    fs::write(
        inbox.join("test_invoice.txt"),
        "Invoice for $500 to John Doe",
    )
    .expect("write invoice");

    let extractor = tmp.path().join("extract.sh");
    write_fake_extractor(&extractor);

    docflow_cmd(tmp.path(), &home, &extractor)
        .arg("watch")
        .arg("--once")
        .assert()
        .success()
        .stdout(contains("archived=1"));

    let artifact = home.join("output/test_invoice_processed.json");
    assert!(artifact.exists());
    let parsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&artifact).expect("read artifact"))
            .expect("parse artifact");
    assert_eq!(parsed["vendor_name"], "John Doe");
    assert_eq!(parsed["total_amount"], 500);

    assert!(inbox.join("archive/test_invoice.txt").exists());
    assert!(!inbox.join("test_invoice.txt").exists());

    let audit = fs::read_to_string(home.join("logs/audit.log")).expect("read audit log");
    assert!(audit.contains("\"phase\":\"discover\""));
    assert!(audit.contains("\"phase\":\"batch\""));
}

#[test]
fn watch_once_keeps_failed_documents_in_the_inbox() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("docflow");
    let inbox = home.join("inbox");
    fs::create_dir_all(&inbox).expect("mkdir inbox");
    fs::write(inbox.join("good.txt"), "Invoice for $12").expect("write good");
    fs::write(inbox.join("stuck.txt"), "poison document").expect("write poison");

    let extractor = tmp.path().join("extract.sh");
    write_fake_extractor(&extractor);

    docflow_cmd(tmp.path(), &home, &extractor)
        .arg("watch")
        .arg("--once")
        .assert()
        .success()
        .stdout(contains("archived=1"))
        .stdout(contains("failed=1"));

    assert!(home.join("output/good_processed.json").exists());
    assert!(inbox.join("archive/good.txt").exists());

    // The failed document is untouched and has no artifact.
    assert!(inbox.join("stuck.txt").exists());
    assert!(!home.join("output/stuck_processed.json").exists());
    assert!(!inbox.join("archive/stuck.txt").exists());
}

#[test]
fn watch_once_on_empty_inbox_succeeds() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("docflow");

    let extractor = tmp.path().join("extract.sh");
    write_fake_extractor(&extractor);

    docflow_cmd(tmp.path(), &home, &extractor)
        .arg("watch")
        .arg("--once")
        .assert()
        .success()
        .stdout(contains("scanned=0"));

    assert!(home.join("inbox").is_dir());
    assert!(home.join("output").is_dir());
    assert!(home.join("inbox/archive").is_dir());
}

#[cfg(unix)]
#[test]
fn stop_terminates_a_running_watch_loop() {
    use std::process::Stdio;
    use std::time::{Duration, Instant};

    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("docflow");

    let extractor = tmp.path().join("extract.sh");
    write_fake_extractor(&extractor);

    let mut watcher = std::process::Command::new(env!("CARGO_BIN_EXE_docflow"))
        .arg("watch")
        .current_dir(tmp.path())
        .env("DOCFLOW_HOME", &home)
        .env("DOCFLOW_CONFIG_PATH", tmp.path().join("no-config.toml"))
        .env("DOCFLOW_EXTRACT_PROVIDER", "command")
        .env("DOCFLOW_EXTRACT_CMD", &extractor)
        .env("DOCFLOW_POLL_INTERVAL_SECS", "1")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn watcher");

    // Wait for the loop to come up (the lock file carries its pid).
    let lock = home.join("logs/docflow-watch.lock");
    let deadline = Instant::now() + Duration::from_secs(10);
    while !lock.exists() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(50));
    }
    assert!(lock.exists(), "watch loop never acquired its lock");

    docflow_cmd(tmp.path(), &home, &extractor)
        .arg("stop")
        .assert()
        .success();

    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        if let Some(status) = watcher.try_wait().expect("try_wait") {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = watcher.kill();
            panic!("watch loop ignored the stop signal");
        }
        std::thread::sleep(Duration::from_millis(50));
    };
    assert!(status.success(), "watch loop exited uncleanly: {status}");
}

#[test]
fn rerunning_watch_reprocesses_a_reinserted_document() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("docflow");
    let inbox = home.join("inbox");
    fs::create_dir_all(&inbox).expect("mkdir inbox");

    let extractor = tmp.path().join("extract.sh");
    write_fake_extractor(&extractor);

    fs::write(inbox.join("doc.txt"), "first pass").expect("write");
    docflow_cmd(tmp.path(), &home, &extractor)
        .arg("watch")
        .arg("--once")
        .assert()
        .success();

    fs::write(inbox.join("doc.txt"), "second pass").expect("reinsert");
    docflow_cmd(tmp.path(), &home, &extractor)
        .arg("watch")
        .arg("--once")
        .assert()
        .success()
        .stdout(contains("archived=1"));

    assert!(!inbox.join("doc.txt").exists());
    assert!(inbox.join("archive/doc.txt").exists());
    assert!(home.join("output/doc_processed.json").exists());
}
