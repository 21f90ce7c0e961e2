//! End-to-end planning over small on-disk Python projects.
//!
//! Covers:
//!   - Package layouts with absolute and relative imports
//!   - Cycle breaking across several independent loops
//!   - Per-module failures (syntax errors, non UTF-8 files) staying local
//!   - Config switches changing what counts as a dependency

use depsort_core::config::{CONFIG_PATH, Config, load_config};
use depsort_core::error::PlanError;
use depsort_core::graph::find_cycle;
use depsort_core::plan;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

fn write(root: &Path, rel: &str, source: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent");
    }
    std::fs::write(&path, source).expect("write source");
    PathBuf::from(rel)
}

fn names(plan: &depsort_core::Plan) -> Vec<String> {
    plan.order
        .iter()
        .map(|p| plan.qualified_name(p).unwrap_or("?").to_string())
        .collect()
}

fn position(plan: &depsort_core::Plan, name: &str) -> usize {
    names(plan)
        .iter()
        .position(|n| n == name)
        .unwrap_or_else(|| panic!("{name} missing from order"))
}

// ---------------------------------------------------------------------------
// Layouts
// ---------------------------------------------------------------------------

#[test]
fn layered_package_orders_bottom_up() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    let paths = vec![
        write(root, "shop/__init__.py", ""),
        write(root, "shop/db.py", "import sqlite3\n"),
        write(root, "shop/models.py", "from .db import connect\n"),
        write(root, "shop/api/views.py", "from ..models import Order\nfrom ..db import connect\n"),
        write(root, "shop/api/urls.py", "from .views import index\n"),
        write(root, "manage.py", "import shop.api.urls\n"),
    ];

    let plan = plan(root, &paths, &Config::default()).expect("plan");

    assert!(plan.breaks.is_empty());
    assert_eq!(plan.order.len(), paths.len());
    assert!(position(&plan, "shop.db") < position(&plan, "shop.models"));
    assert!(position(&plan, "shop.models") < position(&plan, "shop.api.views"));
    assert!(position(&plan, "shop.api.views") < position(&plan, "shop.api.urls"));
    assert!(position(&plan, "shop.api.urls") < position(&plan, "manage"));
}

#[test]
fn from_import_depends_on_module_not_member() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    let paths = vec![
        write(root, "app.py", "from lib import tools\n"),
        write(root, "lib.py", ""),
        write(root, "lib/tools.py", ""),
    ];

    let plan = plan(root, &paths, &Config::default()).expect("plan");
    let deps: Vec<&Path> = plan
        .dependencies
        .dependencies(Path::new("app.py"))
        .expect("app node")
        .iter()
        .map(PathBuf::as_path)
        .collect();
    assert_eq!(deps, vec![Path::new("lib.py")]);
}

#[test]
fn absolute_input_paths_are_accepted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    write(root, "a.py", "import b\n");
    write(root, "b.py", "");

    let paths = vec![root.join("a.py"), root.join("b.py")];
    let plan = plan(root, &paths, &Config::default()).expect("plan");
    assert_eq!(names(&plan), vec!["b", "a"]);
}

// ---------------------------------------------------------------------------
// Cycles
// ---------------------------------------------------------------------------

#[test]
fn every_cycle_is_broken_and_reduced_graph_is_acyclic() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    let paths = vec![
        write(root, "a.py", "import b\n"),
        write(root, "b.py", "import c\n"),
        write(root, "c.py", "import a\n"),
        write(root, "x.py", "import y\n"),
        write(root, "y.py", "import x\n"),
        write(root, "solo.py", "import solo\n"),
        write(root, "main.py", "import a\nimport x\n"),
    ];

    let plan = plan(root, &paths, &Config::default()).expect("plan");

    let removed: Vec<&Path> = plan.removed().collect();
    assert_eq!(
        removed,
        vec![Path::new("a.py"), Path::new("x.py"), Path::new("solo.py")]
    );
    assert!(find_cycle(&plan.reduced).is_none());
    assert!(find_cycle(&plan.dependencies).is_some());
    assert_eq!(names(&plan), vec!["c", "b", "main", "y"]);
}

#[test]
fn cycle_report_names_the_loop() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    let paths = vec![
        write(root, "alpha.py", "import beta\n"),
        write(root, "beta.py", "import alpha\n"),
    ];

    let plan = plan(root, &paths, &Config::default()).expect("plan");
    assert_eq!(plan.breaks.len(), 1);
    assert_eq!(
        plan.breaks[0].cycle.to_string(),
        "alpha.py -> beta.py -> alpha.py"
    );
}

// ---------------------------------------------------------------------------
// Per-module failures
// ---------------------------------------------------------------------------

#[test]
fn broken_modules_stay_in_the_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    let mut paths = vec![
        write(root, "good.py", "import bad\nimport binary\n"),
        write(root, "bad.py", "import good\nclass (:\n"),
    ];
    let binary = root.join("binary.py");
    std::fs::write(&binary, [0xff, 0xfe, 0x00, 0x80]).expect("write binary");
    paths.push(PathBuf::from("binary.py"));

    let plan = plan(root, &paths, &Config::default()).expect("plan");

    assert!(plan.breaks.is_empty());
    assert_eq!(names(&plan), vec!["bad", "binary", "good"]);
}

#[test]
fn name_collision_aborts_the_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    let paths = vec![write(root, "a/b.py", ""), write(root, "a.b.py", "")];

    let err = plan(root, &paths, &Config::default()).expect_err("collision");
    assert!(matches!(err, PlanError::NameCollision { ref name, .. } if name == "a.b"));
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[test]
fn disabling_bare_references_drops_heuristic_edges() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    let paths = vec![
        write(root, "main.py", "helpers.run()\n"),
        write(root, "helpers.py", "def run():\n    pass\n"),
    ];

    let with_refs = plan(root, &paths, &Config::default()).expect("plan");
    assert_eq!(with_refs.dependencies.edge_count(), 1);

    std::fs::create_dir_all(root.join(".depsort")).expect("config dir");
    std::fs::write(
        root.join(CONFIG_PATH),
        "[analysis]\nbare_references = false\nparallel = false\n",
    )
    .expect("write config");
    let config = load_config(root).expect("load config");

    let without_refs = plan(root, &paths, &config).expect("plan");
    assert_eq!(without_refs.dependencies.edge_count(), 0);
    assert_eq!(names(&without_refs), vec!["helpers", "main"]);
}

#[test]
fn extra_extensions_admit_stub_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    let paths = vec![
        write(root, "api.pyi", "import core\n"),
        write(root, "core.py", ""),
    ];

    let default_plan = plan(root, &paths, &Config::default()).expect("plan");
    assert_eq!(default_plan.order.len(), 1);
    assert_eq!(default_plan.skipped, 1);

    let mut config = Config::default();
    config.modules.extensions.push("pyi".to_string());
    let stub_plan = plan(root, &paths, &config).expect("plan");
    assert_eq!(names(&stub_plan), vec!["core", "api"]);
}
