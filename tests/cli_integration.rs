//! Integration tests for the cloudkeychain CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.  The
//! master password comes from `CLOUDKEYCHAIN_PASSWORD` and item passwords
//! from stdin, so nothing prompts.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const PASSWORD: &str = "hunter2-hunter2";

/// Helper: get a Command pointing at the cloudkeychain binary.
fn cloudkeychain() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("cloudkeychain").expect("binary should exist")
}

/// Helper: a project dir with a fast-KDF config file.
fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    tmp.child(".cloudkeychain.toml")
        .write_str("iterations = 100\n")
        .unwrap();
    tmp
}

/// Helper: a command run inside `dir` with the master password set.
fn in_project(dir: &TempDir) -> Command {
    let mut cmd = cloudkeychain();
    cmd.current_dir(dir.path())
        .env("CLOUDKEYCHAIN_PASSWORD", PASSWORD)
        .env_remove("CLOUDKEYCHAIN_NEW_PASSWORD");
    cmd
}

fn init(dir: &TempDir) {
    in_project(dir).arg("init").assert().success();
}

/// Add an item and return its uuid, parsed from the success message.
fn add(dir: &TempDir, title: &str, password: &str) -> String {
    let out = in_project(dir)
        .args(["add", title, "--username", "alice"])
        .write_stdin(password)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(out).unwrap();
    let start = stdout.find(" as ").expect("uuid in output") + 4;
    stdout[start..start + 32].to_string()
}

#[test]
fn help_flag_shows_usage() {
    cloudkeychain()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Password-protected cloud keychain manager",
        ))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("trash"))
        .stdout(predicate::str::contains("change-password"))
        .stdout(predicate::str::contains("info"));
}

#[test]
fn version_flag_shows_version() {
    cloudkeychain()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cloudkeychain"));
}

#[test]
fn no_args_shows_help() {
    cloudkeychain()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn info_on_missing_keychain_fails() {
    let tmp = project();
    in_project(&tmp)
        .arg("info")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn init_creates_profile_folder() {
    let tmp = project();
    init(&tmp);

    tmp.child("default.cloudkeychain/default/profile.js")
        .assert(predicate::str::starts_with("var profile="));

    in_project(&tmp)
        .arg("info")
        .env_remove("CLOUDKEYCHAIN_PASSWORD")
        .assert()
        .success()
        .stdout(predicate::str::contains("iterations:  100"));
}

#[test]
fn init_twice_fails() {
    let tmp = project();
    init(&tmp);
    in_project(&tmp)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn init_rejects_short_password() {
    let tmp = project();
    cloudkeychain()
        .current_dir(tmp.path())
        .env("CLOUDKEYCHAIN_PASSWORD", "short")
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 8"));
}

#[test]
fn add_list_and_reveal() {
    let tmp = project();
    init(&tmp);
    let uuid = add(&tmp, "Example", "s3cret-value");

    tmp.child(format!("default.cloudkeychain/default/band_{}.js", &uuid[..1]))
        .assert(predicate::str::starts_with("ld("));

    in_project(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Example"))
        .stdout(predicate::str::contains(uuid.as_str()));

    in_project(&tmp)
        .args(["show", uuid.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Example"))
        .stdout(predicate::str::contains("s3cret-value").not());

    in_project(&tmp)
        .args(["show", uuid.as_str(), "--reveal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("s3cret-value"));
}

#[test]
fn wrong_password_is_rejected() {
    let tmp = project();
    init(&tmp);
    cloudkeychain()
        .current_dir(tmp.path())
        .env("CLOUDKEYCHAIN_PASSWORD", "not-the-password")
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Wrong master password"));
}

#[test]
fn trash_and_restore() {
    let tmp = project();
    init(&tmp);
    let uuid = add(&tmp, "Old login", "pw");

    in_project(&tmp).args(["trash", uuid.as_str()]).assert().success();
    in_project(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Old login").not());
    in_project(&tmp)
        .args(["list", "--trashed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Old login"));

    in_project(&tmp)
        .args(["trash", uuid.as_str(), "--restore"])
        .assert()
        .success();
    in_project(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Old login"));
}

#[test]
fn show_rejects_malformed_uuid() {
    let tmp = project();
    init(&tmp);
    in_project(&tmp)
        .args(["show", "not-a-uuid"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("32 hex digits"));
}

#[test]
fn change_password_switches_master_password() {
    let tmp = project();
    init(&tmp);
    let uuid = add(&tmp, "Example", "kept");

    in_project(&tmp)
        .arg("change-password")
        .env("CLOUDKEYCHAIN_NEW_PASSWORD", "brand-new-password")
        .assert()
        .success();

    in_project(&tmp)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Wrong master password"));

    cloudkeychain()
        .current_dir(tmp.path())
        .env("CLOUDKEYCHAIN_PASSWORD", "brand-new-password")
        .args(["show", uuid.as_str(), "--reveal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kept"));
}

#[test]
fn custom_keychain_and_profile_flags() {
    let tmp = project();
    in_project(&tmp)
        .args(["--keychain", "work.cloudkeychain", "--profile", "team", "init"])
        .assert()
        .success();

    tmp.child("work.cloudkeychain/team/profile.js")
        .assert(predicate::path::exists());
    tmp.child("default.cloudkeychain")
        .assert(predicate::path::missing());
}
