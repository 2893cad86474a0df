//! Command-line behaviour of playsync-cli.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn cli() -> Command {
    Command::cargo_bin("playsync-cli").unwrap()
}

#[test]
fn encode_check_prints_wire_json() {
    cli()
        .args([
            "encode", "--kind", "CHECK", "--seek", "42.5", "--playing", "--expire-id", "7",
            "--time", "1000",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""type":"CHECK""#))
        .stdout(predicate::str::contains(r#""expireId":7"#))
        .stdout(predicate::str::contains(r#""seek":42.5"#));
}

#[test]
fn encode_accepts_lowercase_kind() {
    cli()
        .args(["encode", "--kind", "change_seek", "--seek", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CHANGE_SEEK"))
        .stdout(predicate::str::contains("playing").not());
}

#[test]
fn encode_rejects_unknown_kind() {
    cli()
        .args(["encode", "--kind", "REWIND"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("REWIND"));
}

#[test]
fn simulate_rejects_invalid_config() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "check_interval_secs = 0").unwrap();

    cli()
        .args(["simulate", "--seconds", "1", "--config"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn simulate_prints_summary() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "check_interval_secs = 1").unwrap();
    writeln!(file, "seek_quiet_secs = 1").unwrap();

    cli()
        .args(["simulate", "--seconds", "3", "--config"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("PLAY"))
        .stdout(predicate::str::contains("Summary:"));
}
