use crate::{newest_owned, GraphStore, Result, StoreError};
use async_trait::async_trait;
use codemap_graph::{unix_now_ms, ProjectGraph};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const RECORD_EXTENSION: &str = "json";

/// One pretty-printed JSON record per project id under a directory.
///
/// Each write goes to its own temp file in the same directory and is renamed
/// into place, so readers only ever see complete records and concurrent
/// writers of one id end with the last rename. Records that fail to parse are skipped by
/// scans and reported by direct reads.
#[derive(Debug, Clone)]
pub struct JsonFileGraphStore {
    dir: PathBuf,
}

impl JsonFileGraphStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, project_id: &str) -> Result<PathBuf> {
        validate_key(project_id)?;
        Ok(self.dir.join(format!("{project_id}.{RECORD_EXTENSION}")))
    }

    async fn read_record(path: &Path) -> Result<Option<ProjectGraph>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Every parseable record with its path
    async fn scan(&self) -> Result<Vec<(PathBuf, ProjectGraph)>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            match Self::read_record(&path).await {
                Ok(Some(graph)) => records.push((path, graph)),
                Ok(None) => {}
                Err(err) => log::warn!("Skipping unreadable graph record {}: {err}", path.display()),
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl GraphStore for JsonFileGraphStore {
    async fn upsert(&self, graph: &ProjectGraph) -> Result<()> {
        let path = self.record_path(&graph.project_id)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let bytes = serde_json::to_vec_pretty(graph)?;
        let dir = self.dir.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&dir, &target, &bytes)).await??;
        log::debug!("Stored graph {} at {}", graph.project_id, path.display());
        Ok(())
    }

    async fn get(&self, project_id: &str) -> Result<Option<ProjectGraph>> {
        let path = self.record_path(project_id)?;
        let now = unix_now_ms();
        Ok(Self::read_record(&path)
            .await?
            .filter(|g| !g.is_expired_at(now)))
    }

    async fn latest_for_project(
        &self,
        persistent_project_id: &str,
        user_id: &str,
    ) -> Result<Option<ProjectGraph>> {
        let now = unix_now_ms();
        let records = self.scan().await?;
        Ok(newest_owned(
            records.iter().map(|(_, g)| g),
            persistent_project_id,
            user_id,
            now,
        )
        .cloned())
    }

    async fn sweep_expired(&self) -> Result<usize> {
        let now = unix_now_ms();
        let mut removed = 0;
        for (path, graph) in self.scan().await? {
            if !graph.is_expired_at(now) {
                continue;
            }
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                // Swept concurrently.
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(removed)
    }
}

fn write_atomic(dir: &Path, target: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|err| err.error)?;
    Ok(())
}

/// Keys become file names, so only `[A-Za-z0-9_-]` is accepted
fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_must_be_file_name_safe() {
        assert!(validate_key("a1b2-c3_d4").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("a/b").is_err());
        assert!(validate_key("a.json").is_err());
    }
}
