use crate::config::ScanConfig;
use crate::error::{AnalyzerError, Result};
use codemap_extractor::Language;
use codemap_graph::{FileChange, SourceFile};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Reads project sources from disk.
///
/// Walks the root honouring `.gitignore` and skipping hidden entries, keeps
/// files with a recognised language, and drops excluded, oversized or
/// non-UTF-8 files. Paths come back root-relative with `/` separators.
#[derive(Debug, Clone)]
pub struct SourceLoader {
    root: PathBuf,
    max_file_bytes: u64,
    exclude: GlobSet,
}

impl SourceLoader {
    pub fn new(root: impl Into<PathBuf>, scan: &ScanConfig) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &scan.exclude {
            let glob = Glob::new(pattern).map_err(|e| AnalyzerError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            builder.add(glob);
        }
        let exclude = builder.build().map_err(|e| AnalyzerError::InvalidPattern {
            pattern: scan.exclude.join(", "),
            message: e.to_string(),
        })?;

        Ok(Self {
            root: root.into(),
            max_file_bytes: scan.max_file_bytes,
            exclude,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// [`SourceLoader::load_blocking`] on the blocking pool
    pub async fn load(&self) -> Result<Vec<SourceFile>> {
        let loader = self.clone();
        tokio::task::spawn_blocking(move || loader.load_blocking()).await?
    }

    /// Every accepted file under the root, sorted by path
    pub fn load_blocking(&self) -> Result<Vec<SourceFile>> {
        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .require_git(false)
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    log::warn!("Skipping unreadable entry: {err}");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let Some(rel) = relative_path(&self.root, entry.path()) else {
                continue;
            };
            if !self.accepts(&rel) {
                continue;
            }
            if let Some(content) = self.read_source(entry.path(), &rel)? {
                files.push(SourceFile::new(rel, content));
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        log::debug!("Loaded {} source files from {}", files.len(), self.root.display());
        Ok(files)
    }

    /// Turn changed root-relative paths into graph changes: readable,
    /// accepted files are upserts, everything else is a removal.
    pub fn changes_for(&self, paths: &[String]) -> Result<Vec<FileChange>> {
        let mut changes = Vec::with_capacity(paths.len());
        for raw in paths {
            let rel = normalize_relative(raw);
            let full = self.root.join(&rel);
            let content = if full.is_file() && self.accepts(&rel) {
                self.read_source(&full, &rel)?
            } else {
                None
            };
            changes.push(match content {
                Some(content) => FileChange::Upsert(SourceFile::new(rel, content)),
                None => FileChange::Remove(rel),
            });
        }
        Ok(changes)
    }

    fn accepts(&self, rel: &str) -> bool {
        Language::from_path(rel) != Language::Unknown && !self.exclude.is_match(rel)
    }

    fn read_source(&self, path: &Path, rel: &str) -> Result<Option<String>> {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        if metadata.len() > self.max_file_bytes {
            log::debug!("Skipping {rel}: {} bytes over limit", metadata.len());
            return Ok(None);
        }
        match String::from_utf8(std::fs::read(path)?) {
            Ok(content) => Ok(Some(content)),
            Err(_) => {
                log::debug!("Skipping {rel}: not valid UTF-8");
                Ok(None)
            }
        }
    }
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

fn normalize_relative(raw: &str) -> String {
    raw.replace('\\', "/")
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/")
}
