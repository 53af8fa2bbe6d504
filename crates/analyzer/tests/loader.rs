//! SourceLoader against real directories

use codemap_analyzer::{CodemapConfig, ScanConfig, SourceLoader};
use codemap_graph::FileChange;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "src/app.ts", b"import { a } from './lib/a';");
    write(root, "src/lib/a.ts", b"export const a = 1;");
    write(root, "main.py", b"import os\n");
    write(root, "README.md", b"# docs");
    write(root, "node_modules/pkg/index.js", b"module.exports = 1;");
    write(root, "ignored/skip.js", b"export const s = 1;");
    write(root, ".gitignore", b"ignored/\n");
    write(root, ".hidden/secret.js", b"export const h = 1;");
    write(root, "big.js", &vec![b'a'; 64]);
    write(root, "binary.js", &[0xff, 0xfe, 0x00]);
    dir
}

#[tokio::test]
async fn test_load_filters_and_sorts() {
    let dir = fixture();
    let scan = ScanConfig {
        max_file_bytes: 32,
        ..ScanConfig::default()
    };
    let loader = SourceLoader::new(dir.path(), &scan).unwrap();
    let files = loader.load().await.unwrap();

    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["main.py", "src/app.ts", "src/lib/a.ts"]);
    assert_eq!(files[2].content, "export const a = 1;");
}

#[test]
fn test_changes_map_to_upserts_and_removals() {
    let dir = fixture();
    let loader = SourceLoader::new(dir.path(), &ScanConfig::default()).unwrap();
    let changes = loader
        .changes_for(&[
            "./src/lib/a.ts".to_string(),
            "src/gone.ts".to_string(),
            "README.md".to_string(),
        ])
        .unwrap();

    assert_eq!(changes.len(), 3);
    assert!(matches!(&changes[0], FileChange::Upsert(f) if f.path == "src/lib/a.ts"));
    assert_eq!(changes[1], FileChange::Remove("src/gone.ts".into()));
    assert_eq!(changes[2], FileChange::Remove("README.md".into()));
}

#[test]
fn test_bad_exclude_pattern_is_reported() {
    let scan = ScanConfig {
        exclude: vec!["src/[".into()],
        ..ScanConfig::default()
    };
    assert!(SourceLoader::new(".", &scan).is_err());
}

#[test]
fn test_config_file_in_root_is_picked_up() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "codemap.toml", b"[store]\nttl_hours = 2\n");
    let config = CodemapConfig::load_from_root(dir.path()).unwrap();
    assert_eq!(config.store.ttl_hours, 2);

    let empty = TempDir::new().unwrap();
    assert_eq!(
        CodemapConfig::load_from_root(empty.path()).unwrap(),
        CodemapConfig::default()
    );
}
