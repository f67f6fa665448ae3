//! Integration tests for the hangproto CLI
//!
//! These tests run the binary against protocol libraries and study
//! documents written to temporary directories.

mod match_test;

use assert_cmd::cargo;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper function to create a hangproto command isolated from user config
fn hangproto(config_home: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(cargo::cargo_bin!("hangproto"));
    cmd.env("XDG_CONFIG_HOME", config_home).env("HOME", config_home).env_remove("RUST_LOG");
    cmd
}

/// Helper to write a file, creating parent directories
fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

const CT_PROTOCOL: &str = r#"{
    "id": "ct-chest",
    "name": "CT Chest",
    "protocolMatchingRules": [
        {"attribute": "Modality", "constraint": {"equals": {"value": "CT"}}, "required": true, "weight": 2}
    ],
    "stages": [{
        "name": "Axial",
        "screens": [{
            "layout": {"type": "grid", "rows": 1, "columns": 2},
            "viewports": [
                {"seriesMatchingRules": [{"attribute": "SeriesDescription", "constraint": {"contains": {"value": "AX"}}, "weight": 3}]},
                {"studyMatchingRules": [{"attribute": "abstractPriorValue", "constraint": {"equals": {"value": 1}}}]}
            ]
        }]
    }]
}"#;

const MR_PROTOCOL: &str = r#"
id = "mr-brain"
name = "MR Brain"

[[protocolMatchingRules]]
attribute = "Modality"
required = true
constraint = { equals = { value = "MR" } }
"#;

/// A study document with one axial and one coronal series
fn study_json(uid: &str, modality: &str) -> String {
    serde_json::json!({
        "uid": uid,
        "tags": {"StudyInstanceUID": uid},
        "series": [
            {
                "uid": format!("{uid}.1"),
                "instances": [{
                    "uid": format!("{uid}.1.1"),
                    "tags": {"Modality": modality, "SeriesDescription": "COR", "SeriesNumber": 1, "Rows": 512}
                }]
            },
            {
                "uid": format!("{uid}.2"),
                "instances": [{
                    "uid": format!("{uid}.2.1"),
                    "tags": {"Modality": modality, "SeriesDescription": "AX 5mm", "SeriesNumber": 2, "Rows": 512}
                }]
            }
        ]
    })
    .to_string()
}

// =============================================================================
// General commands
// =============================================================================

#[test]
fn test_version() {
    let home = TempDir::new().unwrap();
    hangproto(home.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hangproto v"));
}

#[test]
fn test_version_json() {
    let home = TempDir::new().unwrap();
    hangproto(home.path())
        .args(["--json", "version"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"version\""));
}

#[test]
fn test_no_command_prints_hint() {
    let home = TempDir::new().unwrap();
    hangproto(home.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("--help"));
}

// =============================================================================
// inspect
// =============================================================================

#[test]
fn test_inspect_directory() {
    let home = TempDir::new().unwrap();
    let lib = home.path().join("lib");
    write(&lib.join("ct.json"), CT_PROTOCOL);
    write(&lib.join("mr.toml"), MR_PROTOCOL);

    let output = hangproto(home.path()).args(["--json", "inspect"]).arg(&lib).output().unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let protocols = report["protocols"].as_array().unwrap();
    assert_eq!(protocols.len(), 2);
    assert_eq!(protocols[0]["id"], "ct-chest");
    assert_eq!(protocols[0]["viewports"], 2);
    assert_eq!(protocols[0]["numberOfPriorsReferenced"], 1);
    assert_eq!(protocols[1]["id"], "mr-brain");
    assert_eq!(protocols[1]["stages"], 0);
}

#[test]
fn test_inspect_human() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("ct.json");
    write(&file, CT_PROTOCOL);

    hangproto(home.path())
        .arg("inspect")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("CT Chest"))
        .stdout(predicate::str::contains("ct-chest"));
}

#[test]
fn test_inspect_invalid_file_fails() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("broken.json");
    write(&file, "{\"stages\": 3}");

    hangproto(home.path())
        .arg("inspect")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken.json"));
}

// =============================================================================
// init
// =============================================================================

#[test]
fn test_init_creates_library_with_fallback_protocol() {
    let home = TempDir::new().unwrap();
    hangproto(home.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("hangproto initialized!"));

    let root = home.path().join("hangproto");
    let config = fs::read_to_string(root.join("config.toml")).unwrap();
    assert!(config.contains("default_protocol_id = \"defaultProtocol\""));
    assert!(root.join("studies").is_dir());

    let output = hangproto(home.path())
        .args(["--json", "inspect"])
        .arg(root.join("protocols"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["protocols"][0]["id"], "defaultProtocol");
    assert_eq!(report["protocols"][0]["locked"], true);
}

#[test]
fn test_init_keeps_existing_config_without_force() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("hangproto").join("config.toml");
    write(&config, "[output]\nshow_details = true\n");

    let output = hangproto(home.path()).args(["--json", "init"]).output().unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["initialized"], false);
    assert_eq!(fs::read_to_string(&config).unwrap(), "[output]\nshow_details = true\n");

    hangproto(home.path()).args(["init", "--force"]).assert().success();
    assert!(fs::read_to_string(&config).unwrap().contains("[library]"));
}
