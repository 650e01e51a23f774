use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[allow(deprecated)]
fn twablet() -> Command {
    let mut cmd = Command::cargo_bin("twablet").expect("binary");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn home_timeline_pages_through_canned_replies() {
    twablet()
        .args(["--mock", "tweets", "home", "--pages", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1000  @twablet_demo: Canned tweet 1000"))
        .stdout(predicate::str::contains("995  @twablet_demo"))
        .stderr(predicate::str::contains("6 tweet(s)"));
}

#[test]
fn search_requires_terms() {
    twablet()
        .args(["--mock", "tweets", "search"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("q"));
}

#[test]
fn search_reads_statuses_field() {
    twablet()
        .args(["--mock", "tweets", "search", "--q", "rust"])
        .assert()
        .success()
        .stderr(predicate::str::contains("3 tweet(s)"));
}

#[test]
fn followers_use_cursor_pages() {
    twablet()
        .args(["--mock", "users", "followers", "--user-id", "1", "--pages", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("@user2 (User 2)"))
        .stdout(predicate::str::contains("@user10 (User 10)"))
        .stderr(predicate::str::contains("9 user(s)"));
}

#[test]
fn list_memberships() {
    twablet()
        .args(["--mock", "lists", "memberships", "--user-id", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("@twablet_demo/list-100"));
}

#[test]
fn favorite_marks_tweet() {
    twablet()
        .args(["--mock", "tweet", "favorite", "42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("42  @twablet_demo").and(predicate::str::contains("[fav]")));
}

#[test]
fn post_echoes_new_status() {
    twablet()
        .args(["--mock", "post", "hello world", "--reply-to", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello world"));
}

#[test]
fn follow_marks_user() {
    twablet()
        .args(["--mock", "user", "follow", "12"])
        .assert()
        .success()
        .stdout(predicate::str::contains("@user12").and(predicate::str::contains("[following]")));
}

#[test]
fn mock_uses_account_from_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("twablet.toml");
    fs::write(
        &path,
        "[account]\nname = \"Alice\"\nuser_id = \"42\"\nscreen_name = \"alice\"\ntoken = \"t\"\ntoken_secret = \"s\"\n",
    )
    .unwrap();

    twablet()
        .arg("--config")
        .arg(&path)
        .args(["--mock", "tweets", "mentions"])
        .assert()
        .success();
}

#[test]
fn real_mode_rejects_incomplete_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("twablet.toml");
    fs::write(&path, "[consumer]\nkey = \"ck\"\n").unwrap();

    twablet()
        .arg("--config")
        .arg(&path)
        .args(["tweets", "home"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Incomplete configuration"));
}
