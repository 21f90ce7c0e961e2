//! E2E tests for `depsort graph` and `depsort cycles`.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

fn depsort_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("depsort"));
    cmd.current_dir(dir);
    cmd.env("DEPSORT_LOG", "error");
    cmd.env_remove("FORMAT");
    cmd.env_remove("RUST_BACKTRACE");
    cmd.env_remove("RUST_LIB_BACKTRACE");
    cmd
}

fn write(root: &Path, rel: &str, source: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent");
    }
    std::fs::write(path, source).expect("write source");
}

fn json_output(dir: &Path, args: &[&str]) -> Value {
    let output = depsort_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("command should not crash");
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON")
}

/// `core` and `util` import each other; `app` uses both.
fn cyclic_project() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();
    write(root, "app.py", "import core\nimport util\n");
    write(root, "core.py", "import util\n");
    write(root, "util.py", "import core\n");
    write(root, "standalone.py", "print('hi')\n");
    dir
}

fn node<'a>(json: &'a Value, module: &str) -> &'a Value {
    json["nodes"]
        .as_array()
        .expect("nodes array")
        .iter()
        .find(|n| n["module"] == module)
        .unwrap_or_else(|| panic!("{module} missing from graph"))
}

// ---------------------------------------------------------------------------
// graph
// ---------------------------------------------------------------------------

#[test]
fn graph_json_lists_every_module_with_dependencies() {
    let dir = cyclic_project();
    let json = json_output(dir.path(), &["graph"]);

    assert_eq!(json["nodes"].as_array().map(Vec::len), Some(4));
    assert_eq!(json["edges"], 4);
    assert_eq!(node(&json, "app")["depends_on"], serde_json::json!(["core", "util"]));
    assert_eq!(node(&json, "standalone")["depends_on"], serde_json::json!([]));
}

#[test]
fn reduced_graph_drops_the_removed_module() {
    let dir = cyclic_project();
    let json = json_output(dir.path(), &["graph", "--reduced"]);

    assert_eq!(json["nodes"].as_array().map(Vec::len), Some(3));
    assert_eq!(json["edges"], 1);
    assert_eq!(node(&json, "app")["depends_on"], serde_json::json!(["util"]));
}

#[test]
fn graph_dot_is_graphviz() {
    let dir = cyclic_project();
    depsort_cmd(dir.path())
        .args(["graph", "--dot"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("digraph"))
        .stdout(predicate::str::contains("label = \"core\""))
        .stdout(predicate::str::contains("->"));
}

#[test]
fn graph_focus_json_reports_both_directions() {
    let dir = cyclic_project();
    let json = json_output(dir.path(), &["graph", "--focus", "core"]);

    assert_eq!(json["module"], "core");
    assert_eq!(json["path"], "core.py");
    assert_eq!(json["depends_on"], serde_json::json!(["util"]));
    assert_eq!(json["depended_on_by"], serde_json::json!(["app", "util"]));
}

#[test]
fn graph_focus_tree_marks_cycle() {
    let dir = cyclic_project();
    depsort_cmd(dir.path())
        .args(["graph", "--focus", "core", "--up", "--format", "pretty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("depends on (processed first):"))
        .stdout(predicate::str::contains("└── util"))
        .stdout(predicate::str::contains("core [⟳ cycle]"))
        .stdout(predicate::str::contains("depended on by").not());
}

#[test]
fn graph_focus_tree_expands_shared_prerequisites_once() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "base.py", "");
    write(dir.path(), "mid.py", "import base\n");
    write(dir.path(), "top.py", "import base\nimport mid\n");

    depsort_cmd(dir.path())
        .args(["graph", "--focus", "top", "--up", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("├── base\n"))
        .stdout(predicate::str::contains("└── mid\n"))
        .stdout(predicate::str::contains("base [↑ above]"));
}

#[test]
fn graph_focus_unknown_module_fails() {
    let dir = cyclic_project();
    depsort_cmd(dir.path())
        .args(["graph", "--focus", "nope", "--format", "text"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("module not found: nope"));
}

#[test]
fn graph_text_is_adjacency_list() {
    let dir = cyclic_project();
    depsort_cmd(dir.path())
        .args(["graph", "--format", "text"])
        .assert()
        .success()
        .stdout("app: core util\ncore: util\nstandalone:\nutil: core\n");
}

// ---------------------------------------------------------------------------
// cycles
// ---------------------------------------------------------------------------

#[test]
fn cycles_json_reports_components_and_breaks() {
    let dir = cyclic_project();
    let json = json_output(dir.path(), &["cycles"]);

    assert_eq!(json["cycles"], serde_json::json!([["core", "util"]]));
    let breaks = json["breaks"].as_array().expect("breaks array");
    assert_eq!(breaks.len(), 1);
    assert_eq!(breaks[0]["removed"], "core");
    assert_eq!(breaks[0]["path"], "core.py");
    assert_eq!(breaks[0]["cycle"], serde_json::json!(["core", "util"]));
}

#[test]
fn cycles_self_import_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "narcissus.py", "import narcissus\n");

    let json = json_output(dir.path(), &["cycles"]);
    assert_eq!(json["cycles"], serde_json::json!([["narcissus"]]));
    assert_eq!(json["breaks"][0]["removed"], "narcissus");
}

#[test]
fn cycles_human_without_cycles() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "a.py", "import b\n");
    write(dir.path(), "b.py", "");

    depsort_cmd(dir.path())
        .args(["cycles", "--format", "pretty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No dependency cycles found."));
}

#[test]
fn completions_generate_script() {
    let dir = TempDir::new().expect("tempdir");
    depsort_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("depsort"));
}
