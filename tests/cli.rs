//! Command-line tests for the fabstream binary

use std::path::PathBuf;
use std::process::Command;

fn fabstream() -> Command {
    Command::new(env!("CARGO_BIN_EXE_fabstream"))
}

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("demos")
        .join(name)
}

#[test]
fn test_build_scan_chain_text() {
    let output = fabstream()
        .args(["build", "--protocol", "scan_chain"])
        .arg(demo("scan_chain.toml"))
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).unwrap();
    let order: Vec<u32> = stdout.lines().map(|line| line.parse().unwrap()).collect();
    assert_eq!(order, (0..10).rev().collect::<Vec<_>>());
}

#[test]
fn test_build_frame_json_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("fabric.json");

    let status = fabstream()
        .args(["build", "--protocol", "frame-based", "--format", "json", "--output"])
        .arg(&out)
        .arg(demo("frame_grid.toml"))
        .status()
        .unwrap();
    assert!(status.success());

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    let bits = json["bits"].as_array().unwrap();
    assert_eq!(bits.len(), 96);
    // First LUT of tile_1: tile address 1, LUT address 00
    assert_eq!(bits[48]["address"], serde_json::json!([true, false, false]));
}

#[test]
fn test_unknown_protocol_fails() {
    let output = fabstream()
        .args(["build", "--protocol", "shift_register"])
        .arg(demo("scan_chain.toml"))
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown configuration protocol"));
}

#[test]
fn test_check_reports_every_protocol() {
    let output = fabstream().arg("check").arg(demo("frame_grid.toml")).output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    for protocol in ["standalone", "scan_chain", "frame_based", "memory_bank"] {
        assert!(stdout.contains(protocol), "{}", stdout);
    }
}

#[test]
fn test_check_flags_frame_failure() {
    let output = fabstream().arg("check").arg(demo("scan_chain.toml")).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("frame_based  FAILED"));
}
