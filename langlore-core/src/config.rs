//! Analyzer configuration.
//!
//! Every tunable the pipeline consumes lives in one explicit structure:
//! exclusion lists, activity floors, normalization ceilings, blend
//! weights, the tier ladder, and the display cutoff. Defaults match the
//! documented constants; a JSON config file and CLI flags may override
//! them.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LangloreError, Result};

/// Languages excluded from analysis unless configured otherwise.
pub const DEFAULT_EXCLUDED_LANGUAGES: [&str; 4] = ["HTML", "CSS", "Makefile", "Dockerfile"];

/// Default number of ranked languages kept for display.
pub const DEFAULT_TOP_N: usize = 10;

/// Blend weights for the proficiency estimator.
///
/// Approximately normalized; they need not sum to exactly 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProficiencyWeights {
    /// Weight of the normalized commit count.
    pub commits: f64,
    /// Weight of the normalized code volume.
    pub volume: f64,
    /// Weight of the normalized repository spread.
    pub repos: f64,
    /// Weight of the averaged quality signal.
    pub quality: f64,
}

impl Default for ProficiencyWeights {
    fn default() -> Self {
        Self {
            commits: 0.30,
            volume: 0.25,
            repos: 0.15,
            quality: 0.30,
        }
    }
}

/// Settings consumed by the proficiency estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProficiencyConfig {
    /// Blend weights applied to the normalized metrics.
    pub weights: ProficiencyWeights,
    /// Hard floor: minimum attributed commits for a language to rank.
    pub min_commits: u64,
    /// Hard floor: minimum total volume for a language to rank.
    pub min_volume: u64,
    /// Commit count at which the commit metric saturates at 100.
    pub max_commits_norm: u64,
    /// Volume at which the volume metric saturates at 100.
    pub max_volume_norm: u64,
    /// Repository count at which the spread metric saturates at 100.
    pub max_repos_norm: u64,
}

impl Default for ProficiencyConfig {
    fn default() -> Self {
        Self {
            weights: ProficiencyWeights::default(),
            min_commits: 5,
            min_volume: 100,
            max_commits_norm: 50,
            max_volume_norm: 10_000,
            max_repos_norm: 10,
        }
    }
}

/// Settings consumed by the ranker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Weight of the usage percentage in the combined score.
    pub usage_weight: f64,
    /// Weight of the proficiency score in the combined score.
    pub proficiency_weight: f64,
    /// Ordered tier labels, lowest tier first.
    pub tier_labels: Vec<String>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            usage_weight: 0.6,
            proficiency_weight: 0.4,
            tier_labels: default_tier_labels(),
        }
    }
}

/// The default eight-step tier ladder, from "Novice" up to "Master".
pub fn default_tier_labels() -> Vec<String> {
    [
        "Novice",
        "Beginner",
        "Apprentice",
        "Intermediate",
        "Competent",
        "Advanced",
        "Expert",
        "Master",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Complete configuration surface for an analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Languages dropped before aggregation.
    pub excluded_languages: BTreeSet<String>,
    /// Repository names dropped by the data source.
    pub excluded_repositories: Vec<String>,
    /// Organizations whose repositories are scanned for contributions.
    pub included_organizations: Vec<String>,
    /// Estimator settings.
    pub proficiency: ProficiencyConfig,
    /// Ranker settings.
    pub ranking: RankingConfig,
    /// Number of ranked languages kept for display.
    pub top_n: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            excluded_languages: DEFAULT_EXCLUDED_LANGUAGES
                .into_iter()
                .map(String::from)
                .collect(),
            excluded_repositories: Vec::new(),
            included_organizations: Vec::new(),
            proficiency: ProficiencyConfig::default(),
            ranking: RankingConfig::default(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from a JSON file.
    ///
    /// A missing file yields the defaults; malformed JSON or invalid
    /// values fail fast with a descriptive error.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(LangloreError::InvalidConfig(
                "top_n must be at least 1".to_string(),
            ));
        }
        if self.ranking.tier_labels.is_empty() {
            return Err(LangloreError::InvalidConfig(
                "tier_labels must not be empty".to_string(),
            ));
        }
        let weights = [
            ("weights.commits", self.proficiency.weights.commits),
            ("weights.volume", self.proficiency.weights.volume),
            ("weights.repos", self.proficiency.weights.repos),
            ("weights.quality", self.proficiency.weights.quality),
            ("usage_weight", self.ranking.usage_weight),
            ("proficiency_weight", self.ranking.proficiency_weight),
        ];
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(LangloreError::InvalidConfig(format!(
                    "{name} must be a non-negative finite number, got {weight}"
                )));
            }
        }
        Ok(())
    }
}
