//! E2E pipeline tests: `gyre sccs` → `gyre catalog` → `gyre select` over a
//! tempdir corpus, including determinism and the skip-invalid-repo path.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn gyre_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("gyre"));
    cmd.current_dir(dir);
    cmd.env("GYRE_LOG", "error");
    cmd
}

fn write_graph(dir: &Path, name: &str, edges: &[(&str, &str)]) -> std::path::PathBuf {
    let nodes: std::collections::BTreeSet<&str> =
        edges.iter().flat_map(|(s, t)| [*s, *t]).collect();
    let record = serde_json::json!({
        "schema_version": 1,
        "language": "python",
        "nodes": nodes.iter().map(|id| serde_json::json!({"id": id})).collect::<Vec<_>>(),
        "edges": edges
            .iter()
            .map(|(s, t)| serde_json::json!({"source": s, "target": t, "relation": "import"}))
            .collect::<Vec<_>>(),
    });
    let path = dir.join(name);
    fs::write(&path, record.to_string()).expect("write graph record");
    path
}

/// Build a two-repo corpus under `root/results` and return the repos file.
fn build_corpus(root: &Path) -> std::path::PathBuf {
    // alpha: triangle a→b→c→a plus pendant c→d.
    let alpha_graph = write_graph(
        root,
        "alpha_graph.json",
        &[("a", "b"), ("b", "c"), ("c", "a"), ("c", "d")],
    );
    // beta: two reciprocal pairs.
    let beta_graph = write_graph(
        root,
        "beta_graph.json",
        &[("x", "y"), ("y", "x"), ("p", "q"), ("q", "p")],
    );

    for (repo, graph) in [("alpha", &alpha_graph), ("beta", &beta_graph)] {
        let out = root.join("results").join(repo).join("main");
        fs::create_dir_all(&out).expect("mkdir");

        let report = out.join("scc_report.json");
        gyre_cmd(root)
            .args([
                "sccs",
                "--graph",
                graph.to_str().expect("utf8 path"),
                "--out",
                report.to_str().expect("utf8 path"),
            ])
            .assert()
            .success();

        gyre_cmd(root)
            .args([
                "catalog",
                "--graph",
                graph.to_str().expect("utf8 path"),
                "--scc-report",
                report.to_str().expect("utf8 path"),
                "--out",
                out.join("cycle_catalog.json").to_str().expect("utf8 path"),
                "--repo",
                repo,
                "--strategy",
                "exact",
            ])
            .assert()
            .success();
    }

    // ghost is listed but never produced a catalog — it must be skipped.
    let repos = root.join("repos.txt");
    fs::write(&repos, "alpha main\nbeta main\nghost main\n").expect("write repos file");
    repos
}

#[test]
fn sccs_reports_cyclic_components() {
    let dir = TempDir::new().expect("tempdir");
    let graph = write_graph(
        dir.path(),
        "graph.json",
        &[("a", "b"), ("b", "c"), ("c", "a"), ("c", "d")],
    );
    let out = dir.path().join("scc_report.json");

    gyre_cmd(dir.path())
        .args([
            "sccs",
            "--graph",
            graph.to_str().expect("utf8 path"),
            "--out",
            out.to_str().expect("utf8 path"),
            "--json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"scc_count\": 1"));

    let report: Value =
        serde_json::from_str(&fs::read_to_string(&out).expect("read report")).expect("valid JSON");
    assert_eq!(report["global_metrics"]["scc_count"], 1);
    assert_eq!(report["sccs"][0]["id"], "scc_0");
    assert_eq!(report["sccs"][0]["size"], 3);
    // d is not cyclic but still gets a node feature.
    assert!(report["node_features"]["d"]["pagerank"].is_number());
}

#[test]
fn sccs_fails_on_invalid_record() {
    let dir = TempDir::new().expect("tempdir");
    let graph = dir.path().join("broken.json");
    fs::write(&graph, r#"{"edges": [{"source": "a"}]}"#).expect("write broken record");

    gyre_cmd(dir.path())
        .args([
            "sccs",
            "--graph",
            graph.to_str().expect("utf8 path"),
            "--out",
            dir.path().join("out.json").to_str().expect("utf8 path"),
        ])
        .assert()
        .failure();
}

#[test]
fn catalog_output_is_deterministic() {
    let dir = TempDir::new().expect("tempdir");
    let graph = write_graph(
        dir.path(),
        "graph.json",
        &[
            ("a", "b"),
            ("b", "c"),
            ("c", "a"),
            ("b", "d"),
            ("d", "a"),
            ("c", "d"),
        ],
    );

    for name in ["first.json", "second.json"] {
        gyre_cmd(dir.path())
            .args([
                "catalog",
                "--graph",
                graph.to_str().expect("utf8 path"),
                "--out",
                dir.path().join(name).to_str().expect("utf8 path"),
                "--repo",
                "demo",
                "--strategy",
                "sample",
                "--seed",
                "12345",
            ])
            .assert()
            .success();
    }

    let first = fs::read(dir.path().join("first.json")).expect("read first");
    let second = fs::read(dir.path().join("second.json")).expect("read second");
    assert_eq!(first, second, "same seed must produce identical bytes");
}

#[test]
fn select_writes_manifest_and_skips_missing_repo() {
    let dir = TempDir::new().expect("tempdir");
    let repos = build_corpus(dir.path());
    let manifest = dir.path().join("cycles_to_analyze.txt");

    gyre_cmd(dir.path())
        .args([
            "select",
            "--repos",
            repos.to_str().expect("utf8 path"),
            "--results-root",
            dir.path().join("results").to_str().expect("utf8 path"),
            "--total",
            "3",
            "--out",
            manifest.to_str().expect("utf8 path"),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 3 lines"));

    let text = fs::read_to_string(&manifest).expect("read manifest");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    for line in &lines {
        let columns: Vec<&str> = line.split_whitespace().collect();
        assert_eq!(columns.len(), 3, "line must be `repo branch cycle-id`");
        assert!(matches!(columns[0], "alpha" | "beta"));
        assert_eq!(columns[1], "main");
        assert!(columns[2].starts_with("scc_"));
    }
}

#[test]
fn select_reports_shortfall_without_fabricating() {
    let dir = TempDir::new().expect("tempdir");
    let repos = build_corpus(dir.path());
    let manifest = dir.path().join("manifest.txt");

    // alpha has 1 cycle, beta has 2 — requesting 10 can only yield 3.
    gyre_cmd(dir.path())
        .args([
            "select",
            "--repos",
            repos.to_str().expect("utf8 path"),
            "--results-root",
            dir.path().join("results").to_str().expect("utf8 path"),
            "--total",
            "10",
            "--out",
            manifest.to_str().expect("utf8 path"),
            "--json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"shortfall\": 7"));

    let text = fs::read_to_string(&manifest).expect("read manifest");
    assert_eq!(text.lines().count(), 3);
}

#[test]
fn select_is_deterministic_across_runs() {
    let dir = TempDir::new().expect("tempdir");
    let repos = build_corpus(dir.path());

    let mut manifests = Vec::new();
    for name in ["m1.txt", "m2.txt"] {
        let path = dir.path().join(name);
        gyre_cmd(dir.path())
            .args([
                "select",
                "--repos",
                repos.to_str().expect("utf8 path"),
                "--results-root",
                dir.path().join("results").to_str().expect("utf8 path"),
                "--total",
                "3",
                "--out",
                path.to_str().expect("utf8 path"),
            ])
            .assert()
            .success();
        manifests.push(fs::read(&path).expect("read manifest"));
    }
    assert_eq!(manifests[0], manifests[1]);
}

#[test]
fn select_rejects_zero_target() {
    let dir = TempDir::new().expect("tempdir");
    let repos = build_corpus(dir.path());

    gyre_cmd(dir.path())
        .args([
            "select",
            "--repos",
            repos.to_str().expect("utf8 path"),
            "--results-root",
            dir.path().join("results").to_str().expect("utf8 path"),
            "--total",
            "0",
            "--out",
            dir.path().join("m.txt").to_str().expect("utf8 path"),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be positive"));
}

#[test]
fn select_per_length_mode() {
    let dir = TempDir::new().expect("tempdir");
    let repos = build_corpus(dir.path());
    let manifest = dir.path().join("per_length.txt");

    gyre_cmd(dir.path())
        .args([
            "select",
            "--repos",
            repos.to_str().expect("utf8 path"),
            "--results-root",
            dir.path().join("results").to_str().expect("utf8 path"),
            "--max-per-length",
            "1",
            "--out",
            manifest.to_str().expect("utf8 path"),
        ])
        .assert()
        .success();

    // One pick for length 3 (alpha's triangle), one for length 2 (beta).
    let text = fs::read_to_string(&manifest).expect("read manifest");
    assert_eq!(text.lines().count(), 2);
}
