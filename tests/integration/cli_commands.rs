#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use staticgraph::store::{self, ArrayName};
use tempfile::TempDir;

const EDGES_CSV: &str = "src,dst\n0,1\n0,2\n1,2\n2,3\n";

fn setup_store(dir: &TempDir) -> PathBuf {
    let csv = dir.path().join("edges.csv");
    fs::write(&csv, EDGES_CSV).expect("write edges");
    let store_path = dir.path().join("store");
    import(&csv, &store_path, 4);
    store_path
}

fn import(csv: &Path, store_path: &Path, nodes: u32) {
    cargo_bin_cmd!("staticgraph")
        .arg("import")
        .arg(store_path)
        .arg("--edges")
        .arg(csv)
        .arg("--nodes")
        .arg(nodes.to_string())
        .assert()
        .success();
}

fn json_output(args: &[&str], store_path: &Path, extra: &[&str]) -> Value {
    let output = cargo_bin_cmd!("staticgraph")
        .args(["--format", "json"])
        .args(args)
        .arg(store_path)
        .args(extra)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("valid json")
}

#[test]
fn import_builds_loadable_store() {
    let dir = TempDir::new().unwrap();
    let store_path = setup_store(&dir);
    let g = store::load(&store_path).unwrap();
    assert_eq!(g.order(), 4);
    assert_eq!(g.s_indptr(), &[0, 2, 3, 4, 4]);
    assert_eq!(g.p_indices(), &[0, 0, 1, 2]);
}

#[test]
fn stats_emits_json() {
    let dir = TempDir::new().unwrap();
    let store_path = setup_store(&dir);
    let json = json_output(&["stats"], &store_path, &[]);
    assert_eq!(json["graph"]["order"], 4);
    assert_eq!(json["graph"]["size"], 4);
    assert!(json["memory"]["total_bytes"].is_number());
    assert!(json["filesystem"]["files"].is_array());
}

#[test]
fn verify_full_succeeds() {
    let dir = TempDir::new().unwrap();
    let store_path = setup_store(&dir);
    let json = json_output(&["verify", "--level", "full"], &store_path, &[]);
    assert!(json["success"].as_bool().unwrap_or(false));
    assert_eq!(json["level"], "full");
}

#[test]
fn verify_failure_exits_with_status_two() {
    let dir = TempDir::new().unwrap();
    let store_path = setup_store(&dir);
    let file = ArrayName::SIndices.path(&store_path);
    let mut bytes = fs::read(&file).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x80;
    fs::write(&file, bytes).unwrap();

    cargo_bin_cmd!("staticgraph")
        .args(["verify", "--level", "full"])
        .arg(&store_path)
        .assert()
        .code(2);
}

#[test]
fn neighbors_lists_both_directions() {
    let dir = TempDir::new().unwrap();
    let store_path = setup_store(&dir);

    let out = json_output(&["neighbors"], &store_path, &["0"]);
    assert_eq!(out["dir"], "out");
    assert_eq!(out["neighbors"], serde_json::json!([1, 2]));

    let inn = json_output(&["neighbors"], &store_path, &["2", "--dir", "in"]);
    assert_eq!(inn["degree"], 2);
    assert_eq!(inn["neighbors"], serde_json::json!([0, 1]));

    let text = cargo_bin_cmd!("staticgraph")
        .arg("neighbors")
        .arg(&store_path)
        .arg("3")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(String::from_utf8(text).unwrap().trim_end(), "3 out (0):");
}

#[test]
fn neighbors_rejects_invalid_node() {
    let dir = TempDir::new().unwrap();
    let store_path = setup_store(&dir);
    for node in ["4", "-1"] {
        let output = cargo_bin_cmd!("staticgraph")
            .arg("neighbors")
            .arg(&store_path)
            .arg(node)
            .assert()
            .code(1)
            .get_output()
            .stderr
            .clone();
        let stderr = String::from_utf8(output).unwrap();
        assert!(stderr.contains("invalid node"), "{stderr}");
    }
}

#[test]
fn import_rejects_out_of_range_ids() {
    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("edges.csv");
    fs::write(&csv, EDGES_CSV).unwrap();
    let store_path = dir.path().join("store");
    let output = cargo_bin_cmd!("staticgraph")
        .arg("import")
        .arg(&store_path)
        .arg("--edges")
        .arg(&csv)
        .args(["--nodes", "3"])
        .assert()
        .code(1)
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8(output).unwrap();
    assert!(stderr.contains("invalid node 3"), "{stderr}");
    assert!(!store_path.exists());
}

#[test]
fn export_round_trips_through_import() {
    let dir = TempDir::new().unwrap();
    let store_path = setup_store(&dir);
    let out = dir.path().join("out.csv");

    cargo_bin_cmd!("staticgraph")
        .arg("export")
        .arg(&store_path)
        .arg("--edges")
        .arg(&out)
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&out).unwrap(), EDGES_CSV);

    let copy = dir.path().join("copy");
    import(&out, &copy, 4);
    let a = store::load(&store_path).unwrap();
    let b = store::load(&copy).unwrap();
    assert_eq!(a.edges().collect::<Vec<_>>(), b.edges().collect::<Vec<_>>());
}

#[test]
fn missing_store_is_reported() {
    let dir = TempDir::new().unwrap();
    let output = cargo_bin_cmd!("staticgraph")
        .arg("stats")
        .arg(dir.path().join("nope"))
        .assert()
        .code(1)
        .get_output()
        .stderr
        .clone();
    assert!(String::from_utf8(output).unwrap().contains("store not found"));
}
