//! Static extraction of candidate dependency names from Python source.
//!
//! Two passes run over one tree-sitter syntax tree:
//!
//! - **Declared imports**: `import a.b`, `from a.b import x`, and the
//!   relative forms `from ..m import x` / `from . import x`. Relative forms
//!   are resolved against the importing module's qualified name.
//! - **Bare references**: identifiers used as a call target (`helper()`) or
//!   as the object of an attribute access (`utils.parse`). This is a
//!   permissive heuristic: any name that happens to equal a module's
//!   qualified name becomes a candidate, false positives included.
//!
//! Nothing here knows which modules exist. Candidates are resolved against
//! the [`ModuleSet`](crate::module::ModuleSet) by the graph builder.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, warn};
use tree_sitter::{Node, Parser, Tree};

use crate::module::Module;

/// Switches for the extraction stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Run the bare-reference pass in addition to declared imports.
    pub bare_references: bool,
    /// Extract modules on the rayon pool instead of sequentially.
    pub parallel: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            bare_references: true,
            parallel: true,
        }
    }
}

/// Candidate dependency names found in one module.
///
/// Declared imports and heuristic bare references are kept apart so callers
/// can tell a confirmed import from a guess; [`Candidates::names`] merges
/// them for resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    /// Fully qualified targets of import statements.
    pub declared: BTreeSet<String>,
    /// Plain identifiers used as call targets or attribute objects.
    pub referenced: BTreeSet<String>,
}

impl Candidates {
    /// Union of declared and referenced names, each yielded once, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.declared.union(&self.referenced).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declared.is_empty() && self.referenced.is_empty()
    }
}

/// Resolve a relative import.
///
/// `level` is the number of leading dots. The last `level` segments of
/// `current` are dropped, then `sub_path` (if any) is appended. Returns
/// `None` when `level` exceeds the number of segments or the result is
/// empty. A `level` of zero returns `sub_path` unchanged.
#[must_use]
pub fn resolve_relative(current: &str, level: usize, sub_path: Option<&str>) -> Option<String> {
    if level == 0 {
        return sub_path.filter(|s| !s.is_empty()).map(str::to_string);
    }

    let parts: Vec<&str> = current.split('.').collect();
    if level > parts.len() {
        return None;
    }

    let mut segments: Vec<&str> = parts[..parts.len() - level].to_vec();
    if let Some(sub) = sub_path {
        segments.extend(sub.split('.').filter(|s| !s.is_empty()));
    }

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("."))
    }
}

/// Extract candidates from `module`'s source text.
///
/// Source that does not parse cleanly yields empty candidates. Python 2
/// `print`/`exec` statements count as parse failures.
#[must_use]
pub fn extract_source(module: &Module, source: &str, options: &ExtractOptions) -> Candidates {
    let Some(tree) = parse(source) else {
        warn!(module = module.qualified_name(), "parser unavailable, no candidates");
        return Candidates::default();
    };

    let root = tree.root_node();
    if root.has_error() || has_legacy_statement(root) {
        warn!(
            module = module.qualified_name(),
            path = %module.path().display(),
            "source has syntax errors, ignoring its dependencies"
        );
        return Candidates::default();
    }

    let src = source.as_bytes();
    let mut candidates = Candidates::default();

    walk(root, |node| match node.kind() {
        "import_statement" => collect_import(node, src, &mut candidates.declared),
        "import_from_statement" => {
            collect_import_from(node, src, module.qualified_name(), &mut candidates.declared);
        }
        "call" if options.bare_references => {
            if let Some(name) = node
                .child_by_field_name("function")
                .and_then(|f| identifier_text(f, src))
            {
                candidates.referenced.insert(name.to_string());
            }
        }
        "attribute" if options.bare_references => {
            if let Some(name) = node
                .child_by_field_name("object")
                .and_then(|o| identifier_text(o, src))
            {
                candidates.referenced.insert(name.to_string());
            }
        }
        _ => {}
    });

    debug!(
        module = module.qualified_name(),
        declared = candidates.declared.len(),
        referenced = candidates.referenced.len(),
        "extracted candidates"
    );
    candidates
}

/// Read `module` from disk (relative to `root`) and extract its candidates.
///
/// Unreadable files yield empty candidates.
#[must_use]
pub fn extract_file(root: &Path, module: &Module, options: &ExtractOptions) -> Candidates {
    let full = root.join(module.path());
    match std::fs::read_to_string(&full) {
        Ok(source) => extract_source(module, &source, options),
        Err(err) => {
            warn!(path = %full.display(), error = %err, "failed to read source, ignoring its dependencies");
            Candidates::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn parse(source: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .ok()?;
    parser.parse(source, None)
}

/// The grammar accepts Python 2 statement forms that Python 3 rejects.
fn has_legacy_statement(root: Node<'_>) -> bool {
    let mut found = false;
    walk(root, |node| {
        found |= matches!(node.kind(), "print_statement" | "exec_statement");
    });
    found
}

/// Pre-order visit of every node under `root`.
fn walk<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>)) {
    let mut cursor = root.walk();
    loop {
        visit(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

fn identifier_text<'s>(node: Node<'_>, src: &'s [u8]) -> Option<&'s str> {
    if node.kind() == "identifier" {
        node.utf8_text(src).ok()
    } else {
        None
    }
}

/// Text of a `dotted_name`, rebuilt from its identifiers so stray
/// whitespace (`a . b`) does not leak into the name.
fn dotted_text(node: Node<'_>, src: &[u8]) -> Option<String> {
    if node.kind() != "dotted_name" {
        return node.utf8_text(src).ok().map(str::to_string);
    }
    let mut cursor = node.walk();
    let parts: Option<Vec<&str>> = node
        .named_children(&mut cursor)
        .map(|part| part.utf8_text(src).ok())
        .collect();
    parts.filter(|p| !p.is_empty()).map(|p| p.join("."))
}

/// `import a.b.c` / `import a.b as x` → `a.b.c` / `a.b`.
fn collect_import(node: Node<'_>, src: &[u8], out: &mut BTreeSet<String>) {
    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        let target = if name.kind() == "aliased_import" {
            name.child_by_field_name("name")
        } else {
            Some(name)
        };
        if let Some(dotted) = target.and_then(|t| dotted_text(t, src)) {
            out.insert(dotted);
        }
    }
}

/// `from M import X` records `M`; relative forms resolve against `current`.
fn collect_import_from(node: Node<'_>, src: &[u8], current: &str, out: &mut BTreeSet<String>) {
    let Some(module_name) = node.child_by_field_name("module_name") else {
        return;
    };

    if module_name.kind() != "relative_import" {
        if let Some(dotted) = dotted_text(module_name, src) {
            out.insert(dotted);
        }
        return;
    }

    let mut level = 0;
    let mut sub_path = None;
    let mut cursor = module_name.walk();
    for child in module_name.named_children(&mut cursor) {
        match child.kind() {
            "import_prefix" => {
                level = child
                    .utf8_text(src)
                    .map_or(0, |dots| dots.chars().filter(|c| *c == '.').count());
            }
            "dotted_name" => sub_path = dotted_text(child, src),
            _ => {}
        }
    }

    match resolve_relative(current, level, sub_path.as_deref()) {
        Some(resolved) => {
            out.insert(resolved);
        }
        None => debug!(
            module = current,
            level, "relative import climbs above the project root, dropped"
        ),
    }
}
