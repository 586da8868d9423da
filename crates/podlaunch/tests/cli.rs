//! Command-line interface tests.

use assert_cmd::Command;
use predicates::prelude::*;

fn podlaunch() -> Command {
    let mut cmd = Command::cargo_bin("podlaunch").unwrap();
    cmd.env_remove("PODLAUNCH_ENGINE")
        .env_remove("PODLAUNCH_CREDS")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn prints_command() {
    podlaunch()
        .args([
            "command", "--rm", "-e", "A=1", "--user", "2000", "--group", "3000", "alpine", "ls",
            "-l",
        ])
        .assert()
        .success()
        .stdout(predicate::eq(
            "podman run --rm --env A=1 --user 2000:3000 alpine ls -l\n",
        ));
}

#[test]
fn prints_json_with_engine_override() {
    podlaunch()
        .args(["--engine", "/usr/bin/podman", "command", "--json", "alpine", "true"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"["/usr/bin/podman","run","alpine","true"]"#,
        ));
}

#[test]
fn reads_container_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("job.json");
    std::fs::write(
        &file,
        r#"{
            "image": "my-image",
            "command": ["git", "status"],
            "network": "none",
            "mounts": [{"type": "volume", "target": "/cache", "readonly": true}]
        }"#,
    )
    .unwrap();

    podlaunch()
        .arg("command")
        .arg("--file")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::eq(
            "podman run --network none --mount type=volume,target=/cache,chown=true,readonly=true my-image git status\n",
        ));
}

#[test]
fn rejects_unknown_mount_type() {
    podlaunch()
        .args(["command", "--mount", "type=tmpfs,target=/tmp", "alpine"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown mount type: tmpfs"));
}

#[test]
fn missing_engine_fails_pull() {
    podlaunch()
        .args(["--engine", "/nonexistent/podman", "pull", "alpine"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to spawn"));
}
