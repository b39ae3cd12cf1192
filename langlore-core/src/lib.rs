#![deny(missing_docs)]
//! Langlore core library.
//!
//! This crate contains the domain types and scoring primitives that turn
//! per-repository language statistics into a ranked proficiency profile.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod estimate;
pub mod oracle;
pub mod rank;
pub mod report;
pub mod volume;

pub use aggregate::{aggregate, usage_percentages};
pub use cache::{CacheEntry, QualityCache};
pub use config::{
    AnalyzerConfig, ProficiencyConfig, ProficiencyWeights, RankingConfig, default_tier_labels,
};
pub use domain::{
    LanguageAggregate, LanguageVolumes, ProficiencyEntry, RankedLanguage, RankingReport,
    RepositoryRecord,
};
pub use error::{LangloreError, Result};
pub use estimate::{NEUTRAL_QUALITY, estimate};
pub use oracle::{NullQualityOracle, QualityAssessment, QualityOracle, apply_quality_scores};
pub use rank::{SCORE_EPSILON, rank, tier_label};
pub use report::{
    RenderOptions, build_report, format_thousands, render_json, render_profile_markdown,
};
pub use volume::{classify_path, estimate_volumes, typical_volume};
