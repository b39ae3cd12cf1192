//! Persistent cache of quality assessments.
//!
//! Scores are keyed by repository name and guarded by a content
//! fingerprint (the repository's latest commit hash). A cached score is
//! only reused when the stored fingerprint matches the current one
//! exactly, so any new commit invalidates the entry.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::validate_quality_score;
use crate::error::Result;

/// One cached assessment for a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Content fingerprint the score was computed against.
    pub fingerprint: String,
    /// Quality score in 0..=100.
    pub quality_score: f64,
}

/// On-disk store of per-repository quality scores.
#[derive(Debug, Clone)]
pub struct QualityCache {
    path: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
}

impl QualityCache {
    /// Load the cache from `path`.
    ///
    /// Loading is best-effort: a missing or unreadable file, malformed
    /// JSON, and entries carrying out-of-range scores or empty
    /// fingerprints all degrade to an empty (or partially loaded)
    /// cache rather than failing the run.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = std::fs::read_to_string(&path)
            .ok()
            .and_then(|contents| {
                serde_json::from_str::<BTreeMap<String, CacheEntry>>(&contents).ok()
            })
            .map(|raw| {
                raw.into_iter()
                    .filter(|(_, entry)| {
                        !entry.fingerprint.is_empty()
                            && validate_quality_score(entry.quality_score).is_ok()
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self { path, entries }
    }

    /// Create an empty cache that will flush to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Look up a score for `repository`, honoring the fingerprint guard.
    ///
    /// Returns `None` when the repository is unknown, when no current
    /// fingerprint is available, or when the fingerprints differ.
    pub fn get(&self, repository: &str, fingerprint: Option<&str>) -> Option<f64> {
        let current = fingerprint?;
        let entry = self.entries.get(repository)?;
        (entry.fingerprint == current).then_some(entry.quality_score)
    }

    /// Store a score for `repository`, replacing any previous entry.
    pub fn put(
        &mut self,
        repository: impl Into<String>,
        fingerprint: impl Into<String>,
        quality_score: f64,
    ) {
        self.entries.insert(
            repository.into(),
            CacheEntry {
                fingerprint: fingerprint.into(),
                quality_score,
            },
        );
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Write the cache back to its file, creating parent directories.
    pub fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_vec_pretty(&self.entries)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }

    /// The file this cache reads from and flushes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Iterate over the cached entries in repository-name order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &CacheEntry)> {
        self.entries
            .iter()
            .map(|(repository, entry)| (repository.as_str(), entry))
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
