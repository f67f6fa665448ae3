//! Integration tests for `hangproto match`

use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

use super::{CT_PROTOCOL, MR_PROTOCOL, hangproto, study_json, write};

fn library(home: &TempDir) -> std::path::PathBuf {
    let lib = home.path().join("protocols");
    write(&lib.join("ct.json"), CT_PROTOCOL);
    write(&lib.join("mr.toml"), MR_PROTOCOL);
    lib
}

fn run_json(cmd: &mut assert_cmd::Command) -> Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_match_selects_protocol_and_images() {
    let home = TempDir::new().unwrap();
    let lib = library(&home);
    let study = home.path().join("study.json");
    let prior = home.path().join("prior.json");
    write(&study, &study_json("1.1", "CT"));
    write(&prior, &study_json("0.9", "CT"));

    let report = run_json(
        hangproto(home.path())
            .args(["--json", "match", "--study"])
            .arg(&study)
            .arg("--prior")
            .arg(&prior)
            .arg("--protocols")
            .arg(&lib),
    );

    assert_eq!(report["studyInstanceUid"], "1.1");
    assert_eq!(report["bestProtocol"]["id"], "ct-chest");
    assert_eq!(report["bestProtocol"]["score"], 2);
    assert_eq!(report["nonMatched"][0]["id"], "mr-brain");
    assert_eq!(report["stage"], "Axial");

    let viewports = report["viewports"].as_array().unwrap();
    assert_eq!(viewports.len(), 2);
    assert_eq!(viewports[0]["bestMatch"]["sopInstanceUid"], "1.1.2.1");
    assert_eq!(viewports[0]["bestMatch"]["score"], 3);
    assert_eq!(viewports[0]["candidates"], 1);
    assert_eq!(viewports[1]["bestMatch"]["studyInstanceUid"], "0.9");
}

#[test]
fn test_match_prior_protocol_needs_prior() {
    let home = TempDir::new().unwrap();
    let lib = library(&home);
    let study = home.path().join("study.json");
    write(&study, &study_json("1.1", "CT"));

    // ct-chest references one prior; without priors only the default remains
    let report = run_json(
        hangproto(home.path())
            .args(["--json", "match", "--study"])
            .arg(&study)
            .arg("--protocols")
            .arg(&lib),
    );
    assert_eq!(report["bestProtocol"]["id"], "defaultProtocol");
    assert_eq!(report["bestProtocol"]["score"], 1);
    assert_eq!(report["viewports"].as_array().unwrap().len(), 1);
    assert_eq!(report["viewports"][0]["candidates"], 2);
}

#[test]
fn test_match_prior_by_uid_from_study_directory() {
    let home = TempDir::new().unwrap();
    let lib = library(&home);
    let studies = home.path().join("studies");
    let study = home.path().join("study.json");
    write(&study, &study_json("1.1", "CT"));
    write(&studies.join("0.8.json"), &study_json("0.8", "CT"));

    let report = run_json(
        hangproto(home.path())
            .args(["--json", "match", "--study"])
            .arg(&study)
            .args(["--prior-uid", "0.8", "--studies"])
            .arg(&studies)
            .arg("--protocols")
            .arg(&lib),
    );
    assert_eq!(report["bestProtocol"]["id"], "ct-chest");
    assert_eq!(report["viewports"][1]["bestMatch"]["studyInstanceUid"], "0.8");
}

#[test]
fn test_match_missing_prior_document_reports_viewport_error() {
    let home = TempDir::new().unwrap();
    let lib = library(&home);
    let study = home.path().join("study.json");
    write(&study, &study_json("1.1", "CT"));

    let report = run_json(
        hangproto(home.path())
            .args(["--json", "match", "--study"])
            .arg(&study)
            .args(["--prior-uid", "0.7", "--studies"])
            .arg(home.path().join("studies"))
            .arg("--protocols")
            .arg(&lib),
    );
    assert_eq!(report["bestProtocol"]["id"], "ct-chest");
    assert!(report["viewports"][0]["error"].is_null());
    assert!(report["viewports"][1]["error"].as_str().unwrap().contains("0.7"));
}

#[test]
fn test_match_without_library_uses_builtin_default() {
    let home = TempDir::new().unwrap();
    let study = home.path().join("study.json");
    write(&study, &study_json("1.1", "MR"));

    hangproto(home.path())
        .args(["match", "--study"])
        .arg(&study)
        .assert()
        .success()
        .stdout(predicate::str::contains("Default"))
        .stdout(predicate::str::contains("Viewport 0"));
}

#[test]
fn test_match_human_details() {
    let home = TempDir::new().unwrap();
    let lib = library(&home);
    let study = home.path().join("study.json");
    write(&study, &study_json("1.1", "MR"));

    hangproto(home.path())
        .args(["match", "--details", "--study"])
        .arg(&study)
        .arg("--protocols")
        .arg(&lib)
        .assert()
        .success()
        .stdout(predicate::str::contains("MR Brain"));
}

#[test]
fn test_match_missing_study_fails() {
    let home = TempDir::new().unwrap();
    hangproto(home.path())
        .args(["match", "--study"])
        .arg(home.path().join("nope.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot load study"));
}

#[test]
fn test_match_configured_library() {
    let home = TempDir::new().unwrap();
    let lib = library(&home);
    let study = home.path().join("study.json");
    write(&study, &study_json("1.1", "MR"));
    write(
        &home.path().join("hangproto").join("config.toml"),
        &format!("[library]\nprotocols_dir = {:?}\n\n[output]\njson = true\n", lib.display().to_string()),
    );

    let report = run_json(hangproto(home.path()).args(["match", "--study"]).arg(&study));
    assert_eq!(report["bestProtocol"]["id"], "mr-brain");
}
