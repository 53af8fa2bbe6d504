//! Import specifier resolution against the project manifest.

use std::collections::HashSet;
use std::hash::BuildHasher;

/// Suffixes probed after the bare path, in order; each is retried as `/index<ext>`
pub const PROBE_EXTENSIONS: &[&str] = &[
    ".js", ".jsx", ".ts", ".tsx", ".mjs", ".cjs", ".mts", ".cts", ".py",
];

/// Bare package names (`react`, `@scope/pkg`, `node:fs`) never resolve to project files
#[must_use]
pub fn is_external(specifier: &str) -> bool {
    !(specifier.starts_with('.') || specifier.starts_with('/'))
}

/// Path form of a Python relative module: `.models` becomes `./models`,
/// `..pkg.util` becomes `../pkg/util` and a bare `.` names the package's
/// `__init__`. Absolute modules are left alone.
#[must_use]
pub fn python_module_specifier(module: &str) -> Option<String> {
    let rest = module.trim_start_matches('.');
    let dots = module.len() - rest.len();
    if dots == 0 {
        return None;
    }
    let mut path = if dots == 1 {
        "./".to_string()
    } else {
        "../".repeat(dots - 1)
    };
    if rest.is_empty() {
        path.push_str("__init__");
    } else {
        path.push_str(&rest.replace('.', "/"));
    }
    Some(path)
}

/// Resolve `specifier` imported from `importer` to a path in `known`.
///
/// Relative specifiers resolve against the importer's directory and absolute
/// ones against the project root. Returns `None` for external packages and
/// for paths with no match in the manifest.
#[must_use]
pub fn resolve_import<S: BuildHasher>(
    specifier: &str,
    importer: &str,
    known: &HashSet<String, S>,
) -> Option<String> {
    if is_external(specifier) {
        return None;
    }

    // `./worker.js?url` / `./page#section`
    let specifier = specifier
        .split(['?', '#'])
        .next()
        .unwrap_or(specifier);

    let base = if specifier.starts_with('/') {
        ""
    } else {
        parent_dir(importer)
    };
    let path = normalize(base, specifier);

    let found = candidates(&path).find(|candidate| known.contains(candidate));
    found
}

/// Directory of a root-relative path (`""` for root-level files)
fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Join `specifier` onto `base`, collapsing `.` and popping on `..` (never above the root)
fn normalize(base: &str, specifier: &str) -> String {
    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for segment in specifier.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

fn candidates(path: &str) -> impl Iterator<Item = String> + '_ {
    let bare = (!path.is_empty()).then(|| path.to_string());
    let with_ext = PROBE_EXTENSIONS
        .iter()
        .filter(move |_| !path.is_empty())
        .map(move |ext| format!("{path}{ext}"));
    let index = PROBE_EXTENSIONS.iter().map(move |ext| {
        if path.is_empty() {
            format!("index{ext}")
        } else {
            format!("{path}/index{ext}")
        }
    });
    bare.into_iter().chain(with_ext).chain(index)
}
