//! CLI integration tests
use predicates::prelude::*;
use tempfile::TempDir;

const CHANNEL_ENV: &[&str] = &[
    "USERNAME",
    "OUTPUT",
    "TELEGRAM_TOKEN",
    "TELEGRAM_CHAT_ID",
    "SENT_IDS_FILE",
    "RAW_HTML_FILE",
    "MEDIA_DIR",
];

/// Command running in an empty directory with no relay variables inherited.
fn cmd(workdir: &TempDir) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("eitaa-relay");
    cmd.current_dir(workdir.path());
    for var in CHANNEL_ENV {
        cmd.env_remove(var);
    }
    cmd
}

fn get_fixture_path(name: &str) -> String {
    format!("{}/../../tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

#[test]
fn test_cli_dry_run_writes_posts() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("posts.json");

    cmd(&tmp)
        .args(["--username", "samplenews", "--dry-run", "--input", &get_fixture_path("channel_page.html")])
        .args(["-o", output.to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("samplenews/102"));

    let posts: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    let posts = posts.as_array().unwrap();
    assert_eq!(posts.len(), 7);
    assert_eq!(posts[0]["id"], "samplenews/101");
    assert_eq!(posts[4]["reply_to_message_id"], "101");
    assert!(posts[5].get("reply_to_message_id").is_none());
}

#[test]
fn test_cli_dry_run_does_not_touch_ledger() {
    let tmp = TempDir::new().unwrap();
    let ledger = tmp.path().join("sent_ids.json");

    cmd(&tmp)
        .args(["--username", "samplenews", "--dry-run", "--input", &get_fixture_path("channel_page.html")])
        .args(["--sent-ids-file", ledger.to_str().unwrap()])
        .assert()
        .success();

    assert!(!ledger.exists());
}

#[test]
fn test_cli_plan_marks_sent_posts() {
    let tmp = TempDir::new().unwrap();
    let ledger = tmp.path().join("sent_ids.json");
    std::fs::write(&ledger, r#"["samplenews/101"]"#).unwrap();

    cmd(&tmp)
        .args(["--username", "samplenews", "--dry-run", "--input", &get_fixture_path("channel_page.html")])
        .args(["--sent-ids-file", ledger.to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("already sent"));
}

#[test]
fn test_cli_username_from_env() {
    let tmp = TempDir::new().unwrap();

    cmd(&tmp)
        .env("USERNAME", "samplenews")
        .args(["--dry-run", "--input", &get_fixture_path("channel_page.html")])
        .assert()
        .success();

    assert!(tmp.path().join("posts.json").exists());
}

#[test]
fn test_cli_missing_username() {
    let tmp = TempDir::new().unwrap();

    cmd(&tmp)
        .args(["--dry-run", "--input", &get_fixture_path("channel_page.html")])
        .assert()
        .failure();
}

#[test]
fn test_cli_missing_telegram_settings() {
    let tmp = TempDir::new().unwrap();

    cmd(&tmp)
        .args(["--username", "samplenews", "--input", &get_fixture_path("channel_page.html")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("TELEGRAM_TOKEN"));
}

#[test]
fn test_cli_invalid_chat_id() {
    let tmp = TempDir::new().unwrap();

    cmd(&tmp)
        .args(["--username", "samplenews", "--input", &get_fixture_path("channel_page.html")])
        .args(["--telegram-token", "123:abc", "--telegram-chat-id", "not-a-chat"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid Telegram chat ID"));
}

#[test]
fn test_cli_corrupt_ledger() {
    let tmp = TempDir::new().unwrap();
    let ledger = tmp.path().join("sent_ids.json");
    std::fs::write(&ledger, "not json").unwrap();

    cmd(&tmp)
        .args(["--username", "samplenews", "--dry-run", "--input", &get_fixture_path("channel_page.html")])
        .args(["--sent-ids-file", ledger.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sent post IDs"));
}

#[test]
fn test_cli_empty_channel() {
    let tmp = TempDir::new().unwrap();

    cmd(&tmp)
        .args(["--username", "samplenews", "--dry-run", "--input", &get_fixture_path("empty_channel.html")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No posts found"));
}

#[test]
fn test_cli_invalid_file() {
    let tmp = TempDir::new().unwrap();

    cmd(&tmp)
        .args(["--username", "samplenews", "--dry-run", "--input", "nonexistent.html"])
        .assert()
        .failure();
}

#[test]
fn test_cli_verbose() {
    let tmp = TempDir::new().unwrap();

    cmd(&tmp)
        .args(["-v", "--username", "samplenews", "--dry-run", "--input", &get_fixture_path("channel_page.html")])
        .assert()
        .success()
        .stderr(predicate::str::contains("eitaa-relay"))
        .stderr(predicate::str::contains("Sample News"));
}
