//! Domain entities for langlore.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{LangloreError, Result};

/// A mapping of language names to their byte (or line) volume.
pub type LanguageVolumes = BTreeMap<String, u64>;

/// Validate a quality score against the core's documented [0, 100] scale.
///
/// Collaborators that produce scores on another scale must rescale before
/// handing data to the core; anything outside the range is rejected here.
pub fn validate_quality_score(score: f64) -> Result<f64> {
    if !score.is_finite() {
        return Err(LangloreError::InvalidRecord(format!(
            "quality score must be finite, got {score}"
        )));
    }
    if !(0.0..=100.0).contains(&score) {
        return Err(LangloreError::InvalidRecord(format!(
            "quality score must be within 0..=100, got {score}"
        )));
    }
    Ok(score)
}

/// One analyzed repository, constructed per run from the data source.
///
/// Records are immutable once the pipeline starts consuming them; only the
/// quality score and fingerprint pair outlives the run, via the quality
/// cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    /// Unique repository name.
    pub name: String,
    /// Language volumes observed in this repository.
    pub languages: LanguageVolumes,
    /// Whether the account holder created the repository.
    pub owned: bool,
    /// Whether the account holder only contributed to it.
    pub contributor: bool,
    /// Author commits in this repository.
    ///
    /// Commit attribution is heuristic: every language present in
    /// `languages` is attributed the full commit count.
    pub commit_count: u64,
    /// Quality score on the 0..=100 scale, absent without a scoring signal.
    pub quality_score: Option<f64>,
    /// Opaque content version marker (latest commit hash) for cache keys.
    pub content_fingerprint: Option<String>,
}

impl RepositoryRecord {
    /// Build a record for an owned repository, rejecting an empty name.
    pub fn new(name: impl Into<String>, languages: LanguageVolumes) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(LangloreError::InvalidRecord(
                "repository name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            name,
            languages,
            owned: true,
            contributor: false,
            commit_count: 0,
            quality_score: None,
            content_fingerprint: None,
        })
    }

    /// Mark the record as a contribution rather than an owned repository.
    pub fn as_contribution(mut self) -> Self {
        self.owned = false;
        self.contributor = true;
        self
    }

    /// Attach the author commit count.
    pub fn with_commit_count(mut self, commit_count: u64) -> Self {
        self.commit_count = commit_count;
        self
    }

    /// Attach a validated quality score.
    pub fn with_quality_score(mut self, score: f64) -> Result<Self> {
        self.quality_score = Some(validate_quality_score(score)?);
        Ok(self)
    }

    /// Attach the content fingerprint used for cache validation.
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        let fingerprint = fingerprint.into();
        self.content_fingerprint = if fingerprint.is_empty() {
            None
        } else {
            Some(fingerprint)
        };
        self
    }

    /// Commits attributable to `language` in this repository.
    ///
    /// Realizes the derived per-language commit mapping: the full commit
    /// count for every present language, zero otherwise.
    pub fn attributed_commits(&self, language: &str) -> u64 {
        if self.languages.contains_key(language) {
            self.commit_count
        } else {
            0
        }
    }
}

/// Accumulated totals for one language across all repositories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageAggregate {
    /// Sum of byte (or line) volume across repositories.
    pub total_volume: u64,
    /// Names of the repositories contributing this language.
    pub repository_set: BTreeSet<String>,
    /// Sum of attributed commit counts across repositories.
    pub total_commits: u64,
    /// Quality scores observed for this language, one per scored repository.
    pub quality_samples: Vec<f64>,
}

impl LanguageAggregate {
    /// Mean of the observed quality samples, if any were reported.
    pub fn average_quality(&self) -> Option<f64> {
        if self.quality_samples.is_empty() {
            return None;
        }
        let sum: f64 = self.quality_samples.iter().sum();
        Some(sum / self.quality_samples.len() as f64)
    }
}

/// Per-language proficiency computed by the estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProficiencyEntry {
    /// Share of total observed volume, in percent.
    pub usage_percentage: f64,
    /// Blended proficiency score on the 0..=100 scale.
    pub proficiency_score: f64,
    /// Human-readable tier derived from the proficiency score.
    pub tier_label: String,
}

/// One row of the final ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedLanguage {
    /// Language name.
    pub language: String,
    /// Usage/proficiency blend used for ordering.
    pub combined_score: f64,
    /// Share of total observed volume, in percent.
    pub usage_percentage: f64,
    /// Tier derived from the proficiency score.
    pub tier_label: String,
}

/// Complete analysis output consumed by presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingReport {
    /// Number of repositories analyzed.
    pub total_repositories: usize,
    /// Number of repositories the account holder created.
    pub owned_repositories: usize,
    /// Number of repositories the account holder only contributed to.
    pub contributed_repositories: usize,
    /// Per-language total volume.
    pub language_stats: BTreeMap<String, u64>,
    /// Per-language usage share, summing to roughly 100.
    pub language_percentages: BTreeMap<String, f64>,
    /// Per-language contributing repository names, sorted.
    pub language_repositories: BTreeMap<String, Vec<String>>,
    /// Per-language attributed commit totals.
    pub language_commits: BTreeMap<String, u64>,
    /// Ranked languages, best first, truncated to the configured top-n.
    pub ranking: Vec<RankedLanguage>,
    /// Proficiency entries for languages that cleared the activity floor.
    pub proficiency: BTreeMap<String, ProficiencyEntry>,
    /// Languages excluded from the analysis.
    pub excluded_languages: Vec<String>,
    /// Repositories excluded from the analysis.
    pub excluded_repositories: Vec<String>,
}
