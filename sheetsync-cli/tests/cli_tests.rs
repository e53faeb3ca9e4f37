//! CLI integration tests

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

/// Build command for the sheetsync-cli binary (finds it in target/debug when run via cargo test).
fn sheetsync_cli() -> Command {
    cargo_bin_cmd!("sheetsync-cli")
}

const PARTS_CSV: &str = "\
Refdes,Partition,Symbol,X,Y,Orientation,Scale,Attributes
R1,Discrete,RES.1,100,120,0,1,\"[{\"\"Name\"\":\"\"Value\"\",\"\"Value\"\":\"\"4.7K\"\"}]\"
,,,0,0,,,
";

const NETS_CSV: &str = "\
Segments,Labels,Attributes
\"[[100,220,100,260]]\",\"[{\"\"Name\"\":\"\"net5v\"\",\"\"X\"\":100,\"\"Y\"\":240,\"\"SegX1\"\":100,\"\"SegY1\"\":220,\"\"SegX2\"\":100,\"\"SegY2\"\":260}]\",[]
";

#[test]
fn test_cli_help() {
    let mut cmd = sheetsync_cli();

    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("replication"));
}

#[test]
fn test_cli_version() {
    let mut cmd = sheetsync_cli();

    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_divider_human() {
    let mut cmd = sheetsync_cli();

    cmd.arg("divider");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("net5v"))
        .stdout(predicate::str::contains("net2.5v"))
        .stdout(predicate::str::contains("netgnd"))
        .stdout(predicate::str::contains("DEVICE attributes hidden: 2"));
}

#[test]
fn test_cli_divider_json() {
    let mut cmd = sheetsync_cli();

    cmd.arg("divider").arg("--format").arg("json").arg("--fail-on-diagnostics");
    let output = cmd.assert().success().get_output().stdout.clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let nets = json["divider"]["nets"].as_array().unwrap();
    let names: Vec<&str> = nets.iter().map(|n| n["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["net5v", "net2.5v", "netgnd"]);
    assert_eq!(json["stats"]["geometry"], 0);
}

#[test]
fn test_cli_copy_writes_tables() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = sheetsync_cli();

    cmd.arg("copy").arg("--out-dir").arg(dir.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Schematic2 created and copied from Schematic1:2"))
        .stdout(predicate::str::contains("Labels:     3"));

    let parts = fs::read_to_string(dir.path().join("parts.csv")).unwrap();
    assert!(parts.starts_with("Refdes,Partition,Symbol,X,Y,Orientation,Scale,Attributes"));
    let nets = fs::read_to_string(dir.path().join("net.csv")).unwrap();
    assert!(nets.contains("net2.5v"));
}

#[test]
fn test_cli_copy_direct_json() {
    let mut cmd = sheetsync_cli();

    cmd.arg("copy").arg("--direct").arg("--format").arg("json");
    let output = cmd.assert().success().get_output().stdout.clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["copy"]["components"], 2);
    assert_eq!(json["copy"]["nets"], 3);
    assert!(json["copy"]["parts_file"].is_null());
}

#[test]
fn test_cli_verbose_logs_to_stderr_only() {
    let mut cmd = sheetsync_cli();

    cmd.env_remove("RUST_LOG")
        .arg("-v")
        .arg("copy")
        .arg("--direct")
        .arg("--format")
        .arg("json");
    let assert = cmd
        .assert()
        .success()
        .stderr(predicate::str::contains("Copy into Schematic2 finished (direct) with 0 diagnostic(s)"));
    let json: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(json["copy"]["destination"], "Schematic2");
}

#[test]
fn test_cli_quiet_by_default() {
    let mut cmd = sheetsync_cli();

    cmd.env_remove("RUST_LOG").arg("copy").arg("--direct");
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Copy into").not());
}

#[test]
fn test_cli_inspect_tables() {
    let dir = tempfile::tempdir().unwrap();
    let parts = dir.path().join("parts.csv");
    let nets = dir.path().join("net.csv");
    fs::write(&parts, PARTS_CSV).unwrap();
    fs::write(&nets, NETS_CSV).unwrap();

    let mut cmd = sheetsync_cli();
    cmd.arg("inspect").arg("--parts").arg(&parts).arg("--nets").arg(&nets);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Components: 2"))
        .stdout(predicate::str::contains("[net5v]"));
}

#[test]
fn test_cli_replay_reports_skipped_row() {
    let dir = tempfile::tempdir().unwrap();
    let parts = dir.path().join("parts.csv");
    let nets = dir.path().join("net.csv");
    fs::write(&parts, PARTS_CSV).unwrap();
    fs::write(&nets, NETS_CSV).unwrap();

    let mut cmd = sheetsync_cli();
    cmd.arg("replay").arg("--parts").arg(&parts).arg("--nets").arg(&nets);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Components: 1"))
        .stdout(predicate::str::contains("Labels:     1"))
        .stdout(predicate::str::contains("missing Partition or Symbol"));

    let mut strict = sheetsync_cli();
    strict
        .arg("replay")
        .arg("--parts")
        .arg(&parts)
        .arg("--fail-on-diagnostics");
    strict.assert().failure();
}

#[test]
fn test_cli_inspect_requires_input() {
    let mut cmd = sheetsync_cli();

    cmd.arg("inspect");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("nothing to inspect"));
}

#[test]
fn test_cli_invalid_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("bad.json");
    fs::write(&config, r#"{ "tolerance": -3 }"#).unwrap();

    let mut cmd = sheetsync_cli();
    cmd.arg("--config").arg(&config).arg("divider");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("tolerance"));
}

#[test]
fn test_cli_missing_table_file() {
    let mut cmd = sheetsync_cli();

    cmd.arg("inspect").arg("--nets").arg("does/not/exist.csv");
    cmd.assert().failure().stderr(predicate::str::contains("Error"));
}
