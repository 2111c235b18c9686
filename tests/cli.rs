//! Exit status and error reporting of the binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn watcher() -> Command {
    let mut cmd = Command::cargo_bin("mac_release_watcher").unwrap();
    for var in [
        "WATCH_PAGE_URL",
        "WATCH_LINK_CLASS",
        "WATCH_MD5_HEADER",
        "WATCH_APP_BUNDLE",
        "WATCH_ARTIFACT_NAME",
        "WATCH_WORK_DIR",
        "WATCH_REPO",
        "FORCE_RELEASE",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn invalid_arguments_exit_with_one() {
    watcher()
        .args(["--app-bundle", "WeChat"])
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with(
            "Error: CLI error: Invalid arguments: Invalid app bundle: WeChat",
        ))
        .stderr(predicate::str::contains("hint: Run with --help"));
}

#[test]
fn missing_tools_fail_before_any_request() {
    let dir = tempfile::TempDir::new().unwrap();
    watcher()
        .env("PATH", dir.path())
        .args(["--page-url", "http://127.0.0.1:9/unreachable"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: Required tool `hdiutil` not found in PATH"))
        .stderr(predicate::str::contains("hint: Install `hdiutil`"));
}

#[test]
fn help_exits_cleanly() {
    watcher()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--force-release"));
}
