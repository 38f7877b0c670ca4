// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! End-to-end tests through the `stagegraph` binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const RELEASE_PIPELINE: &str = r#"
apiVersion: stagegraph.io/v1
kind: Pipeline
metadata:
  name: web-release
spec:
  stages:
    - name: qa
      type: node_qa
    - name: qa-ticket
      type: plan_jira
      dependsOn: [qa]
    - name: qa-signoff
      type: approval_manual
      dependsOn: [qa-ticket]
    - name: qa-image
      type: release_docker
      dependsOn: [qa-signoff]
    - name: prod
      type: node_prod
    - name: prod-ticket
      type: plan_jira
      dependsOn: [prod]
    - name: prod-image
      type: release_docker
      dependsOn: [prod-ticket]
    - name: build
      type: build_maven
"#;

const CYCLIC_PIPELINE: &str = r#"
kind: Pipeline
metadata: { name: loop }
spec:
  stages:
    - { name: a, type: build_make, dependsOn: [b] }
    - { name: b, type: test_unit, dependsOn: [a] }
"#;

fn write(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

fn stagegraph(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("stagegraph").unwrap();
    cmd.current_dir(dir).env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_validate_accepts_valid_descriptor() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "pipeline.yaml", RELEASE_PIPELINE);

    stagegraph(temp.path())
        .args(["validate", "pipeline.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Parsed 'web-release' (8 stages)"))
        .stdout(predicate::str::contains("Descriptor is valid!"));
}

#[test]
fn test_validate_rejects_cycle() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "loop.yaml", CYCLIC_PIPELINE);

    stagegraph(temp.path())
        .args(["validate", "loop.yaml"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Circular dependency"));
}

#[test]
fn test_validate_rejects_wrong_kind() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "job.yaml",
        "kind: Job\nmetadata: { name: x }\nspec: { stages: [] }\n",
    );

    stagegraph(temp.path())
        .args(["validate", "job.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected kind 'Pipeline'"));
}

#[test]
fn test_validate_missing_file() {
    let temp = TempDir::new().unwrap();

    stagegraph(temp.path())
        .args(["validate", "absent.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Descriptor file not found"));
}

#[test]
fn test_fields_json() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "pipeline.yaml", RELEASE_PIPELINE);

    let output = stagegraph(temp.path())
        .args(["fields", "pipeline.yaml", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let fields: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let keys: Vec<&str> = fields
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["key"].as_str().unwrap())
        .collect();

    assert_eq!(
        keys,
        vec![
            "plan_jira",
            "approval_qa",
            "release_qa_docker",
            "release_prod_docker"
        ]
    );
    assert_eq!(fields[1]["label"], "QA Sign off(Approver)");
}

#[test]
fn test_fields_text() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "pipeline.yaml", RELEASE_PIPELINE);

    stagegraph(temp.path())
        .args(["fields", "pipeline.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Prod Docker#"))
        .stdout(predicate::str::contains("Jira#"));
}

#[test]
fn test_owner_resolves_transitively() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "pipeline.yaml", RELEASE_PIPELINE);

    stagegraph(temp.path())
        .args(["owner", "pipeline.yaml", "qa-image"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("qa\n"));
}

#[test]
fn test_owner_without_environment() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "pipeline.yaml", RELEASE_PIPELINE);

    stagegraph(temp.path())
        .args(["owner", "pipeline.yaml", "build"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No owning environment"));
}

#[test]
fn test_owner_unknown_stage() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "pipeline.yaml", RELEASE_PIPELINE);

    stagegraph(temp.path())
        .args(["owner", "pipeline.yaml", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Stage 'nope' not found"));
}

#[test]
fn test_graph_mermaid() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "pipeline.yaml", RELEASE_PIPELINE);

    stagegraph(temp.path())
        .args(["graph", "pipeline.yaml", "--format", "mermaid"])
        .assert()
        .success()
        .stdout(predicate::str::contains("node_1[\"qa\"]"))
        .stdout(predicate::str::contains("node_1 --> node_2"));
}

#[test]
fn test_graph_text_lists_cyclic_stages() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "loop.yaml", CYCLIC_PIPELINE);

    stagegraph(temp.path())
        .args(["graph", "loop.yaml", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. a (build_make) [depends: b] [cycle]"))
        .stdout(predicate::str::contains("2. b (test_unit) [depends: a] [cycle]"));
}

#[test]
fn test_fmt_reports_dropped_dependency_once() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "pipeline.yaml",
        "kind: Pipeline\nmetadata: { name: p }\nspec:\n  stages:\n    - { name: a, type: build_make, dependsOn: [ghost] }\n",
    );

    let output = stagegraph(temp.path())
        .env_remove("RUST_LOG")
        .args(["fmt", "pipeline.yaml"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("ghost").count(), 1, "stderr was: {}", stderr);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("ghost"));
}

#[test]
fn test_fmt_fills_positions() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "pipeline.yaml", RELEASE_PIPELINE);

    stagegraph(temp.path())
        .args(["-C"])
        .arg(temp.path())
        .args(["fmt", "pipeline.yaml", "--json", "--output", "out.json"])
        .assert()
        .success();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(temp.path().join("out.json")).unwrap())
            .unwrap();
    let stages = written["spec"]["stages"].as_array().unwrap();
    assert_eq!(stages.len(), 8);
    assert_eq!(stages[1]["position"]["x"], 550.0);
    assert_eq!(stages[1]["dependsOn"][0], "qa");
}

#[test]
fn test_store_round_trip() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "pipeline.yaml", RELEASE_PIPELINE);
    write(temp.path(), ".stagegraph.yaml", "store:\n  directory: saved\n");

    stagegraph(temp.path())
        .args(["store", "put", "web", "pipeline.yaml"])
        .assert()
        .success();
    assert!(temp.path().join("saved").join("web.yaml").exists());

    stagegraph(temp.path())
        .args(["store", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("web-release (8 stages)"));

    stagegraph(temp.path())
        .args(["store", "get", "web"])
        .assert()
        .success()
        .stdout(predicate::str::contains("name: web-release"));

    stagegraph(temp.path())
        .args(["store", "delete", "web"])
        .assert()
        .success();

    stagegraph(temp.path())
        .args(["store", "get", "web"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found in store"));
}

#[test]
fn test_store_rejects_bad_id() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "pipeline.yaml", RELEASE_PIPELINE);

    stagegraph(temp.path())
        .args(["store", "put", ".secret", "pipeline.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid pipeline id"));
}
