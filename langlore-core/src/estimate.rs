//! Proficiency estimation from aggregated language metrics.
//!
//! Each surviving language gets a 0..=100 score blending four
//! normalized signals: attributed commits, code volume, repository
//! spread, and an averaged quality assessment. Languages below the
//! configured activity floors are dropped entirely rather than scored
//! low, so a single drive-by commit never shows up as "Novice Haskell".

use std::collections::BTreeMap;

use crate::aggregate::usage_percentages;
use crate::config::ProficiencyConfig;
use crate::domain::{LanguageAggregate, ProficiencyEntry};
use crate::rank::tier_label;

/// Quality score assumed when no assessment is available.
pub const NEUTRAL_QUALITY: f64 = 60.0;

/// Scale a raw metric onto 0..=100 against a saturation ceiling.
///
/// Values at or above the ceiling pin at 100. A zero ceiling treats
/// any activity as saturated.
fn normalize(raw: u64, cap: u64) -> f64 {
    if cap == 0 {
        if raw == 0 { 0.0 } else { 100.0 }
    } else {
        ((raw as f64 / cap as f64) * 100.0).min(100.0)
    }
}

/// Estimate proficiency for every language clearing the activity floors.
///
/// Returns one entry per survivor with the blended score, the usage
/// percentage computed over the full aggregate map (floors do not
/// reshuffle usage shares), and the tier label its score lands in.
pub fn estimate(
    aggregates: &BTreeMap<String, LanguageAggregate>,
    config: &ProficiencyConfig,
    tier_labels: &[String],
) -> BTreeMap<String, ProficiencyEntry> {
    let usage = usage_percentages(aggregates);
    let weights = &config.weights;

    aggregates
        .iter()
        .filter(|(_, aggregate)| {
            aggregate.total_volume > 0
                && aggregate.total_volume >= config.min_volume
                && aggregate.total_commits >= config.min_commits
        })
        .map(|(language, aggregate)| {
            let commit_norm = normalize(aggregate.total_commits, config.max_commits_norm);
            let volume_norm = normalize(aggregate.total_volume, config.max_volume_norm);
            let spread_norm =
                normalize(aggregate.repository_set.len() as u64, config.max_repos_norm);
            let quality = aggregate.average_quality().unwrap_or(NEUTRAL_QUALITY);

            let score = (weights.commits * commit_norm
                + weights.volume * volume_norm
                + weights.repos * spread_norm
                + weights.quality * quality)
                .clamp(0.0, 100.0);

            let entry = ProficiencyEntry {
                usage_percentage: usage.get(language).copied().unwrap_or(0.0),
                proficiency_score: score,
                tier_label: tier_label(score, tier_labels),
            };
            (language.clone(), entry)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{NEUTRAL_QUALITY, estimate, normalize};
    use crate::config::{ProficiencyConfig, default_tier_labels};
    use crate::domain::LanguageAggregate;
    use std::collections::BTreeMap;

    fn aggregate_with(volume: u64, commits: u64, repos: &[&str]) -> LanguageAggregate {
        LanguageAggregate {
            total_volume: volume,
            repository_set: repos.iter().map(|name| name.to_string()).collect(),
            total_commits: commits,
            quality_samples: Vec::new(),
        }
    }

    fn single(language: &str, aggregate: LanguageAggregate) -> BTreeMap<String, LanguageAggregate> {
        BTreeMap::from([(language.to_string(), aggregate)])
    }

    #[test]
    fn normalize_is_linear_below_cap() {
        assert_eq!(normalize(25, 50), 50.0);
        assert_eq!(normalize(0, 50), 0.0);
    }

    #[test]
    fn normalize_saturates_at_cap() {
        assert_eq!(normalize(50, 50), 100.0);
        assert_eq!(normalize(500, 50), 100.0);
    }

    #[test]
    fn normalize_zero_cap_treats_activity_as_saturated() {
        assert_eq!(normalize(0, 0), 0.0);
        assert_eq!(normalize(1, 0), 100.0);
    }

    #[test]
    fn languages_below_commit_floor_are_dropped() {
        let aggregates = single("Rust", aggregate_with(5_000, 4, &["a"]));
        let scores = estimate(
            &aggregates,
            &ProficiencyConfig::default(),
            &default_tier_labels(),
        );
        assert!(scores.is_empty());
    }

    #[test]
    fn languages_below_volume_floor_are_dropped() {
        let aggregates = single("Rust", aggregate_with(99, 40, &["a"]));
        let scores = estimate(
            &aggregates,
            &ProficiencyConfig::default(),
            &default_tier_labels(),
        );
        assert!(scores.is_empty());
    }

    #[test]
    fn zero_volume_never_survives_even_with_zero_floor() {
        let config = ProficiencyConfig {
            min_volume: 0,
            min_commits: 0,
            ..ProficiencyConfig::default()
        };
        let aggregates = single("Rust", aggregate_with(0, 40, &["a"]));
        let scores = estimate(&aggregates, &config, &default_tier_labels());
        assert!(scores.is_empty());
    }

    #[test]
    fn saturated_metrics_with_full_quality_hit_the_ceiling() {
        let mut aggregate = aggregate_with(
            20_000,
            100,
            &["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k"],
        );
        aggregate.quality_samples.push(100.0);

        let scores = estimate(
            &single("Rust", aggregate),
            &ProficiencyConfig::default(),
            &default_tier_labels(),
        );
        let entry = scores.get("Rust").expect("survivor");
        // 0.30*100 + 0.25*100 + 0.15*100 + 0.30*100 = 100.
        assert!((entry.proficiency_score - 100.0).abs() < 1e-9);
        assert_eq!(entry.tier_label, "Master");
    }

    #[test]
    fn missing_quality_defaults_to_neutral() {
        let aggregates = single("Rust", aggregate_with(10_000, 50, &["a"]));
        let scores = estimate(
            &aggregates,
            &ProficiencyConfig::default(),
            &default_tier_labels(),
        );
        let entry = scores.get("Rust").expect("survivor");
        // Commits and volume saturate, spread is 1/10, quality neutral:
        // 0.30*100 + 0.25*100 + 0.15*10 + 0.30*60 = 74.5.
        let expected = 0.30 * 100.0 + 0.25 * 100.0 + 0.15 * 10.0 + 0.30 * NEUTRAL_QUALITY;
        assert!((entry.proficiency_score - expected).abs() < 1e-9);
    }

    #[test]
    fn quality_samples_average_into_the_blend() {
        let mut with_quality = aggregate_with(10_000, 50, &["a"]);
        with_quality.quality_samples = vec![40.0, 80.0];
        let mut without_quality = aggregate_with(10_000, 50, &["a"]);
        without_quality.quality_samples.clear();

        let scored = estimate(
            &single("Rust", with_quality),
            &ProficiencyConfig::default(),
            &default_tier_labels(),
        );
        let neutral = estimate(
            &single("Rust", without_quality),
            &ProficiencyConfig::default(),
            &default_tier_labels(),
        );

        // Average of 40 and 80 equals the neutral default, so both blend
        // to the same final score.
        let scored_entry = scored.get("Rust").expect("survivor");
        let neutral_entry = neutral.get("Rust").expect("survivor");
        assert!(
            (scored_entry.proficiency_score - neutral_entry.proficiency_score).abs() < 1e-9
        );
    }

    #[test]
    fn usage_shares_come_from_the_unfiltered_map() {
        let mut aggregates = BTreeMap::new();
        aggregates.insert("Rust".to_string(), aggregate_with(6_000, 50, &["a"]));
        // Java misses the commit floor but still holds its usage share.
        aggregates.insert("Java".to_string(), aggregate_with(4_000, 1, &["b"]));

        let scores = estimate(
            &aggregates,
            &ProficiencyConfig::default(),
            &default_tier_labels(),
        );
        assert!(!scores.contains_key("Java"));
        let rust = scores.get("Rust").expect("survivor");
        assert!((rust.usage_percentage - 60.0).abs() < 1e-9);
    }

    #[test]
    fn estimate_is_deterministic() {
        let mut aggregates = BTreeMap::new();
        aggregates.insert("Rust".to_string(), aggregate_with(9_000, 30, &["a", "b"]));
        aggregates.insert("Go".to_string(), aggregate_with(3_000, 12, &["c"]));

        let first = estimate(
            &aggregates,
            &ProficiencyConfig::default(),
            &default_tier_labels(),
        );
        let second = estimate(
            &aggregates,
            &ProficiencyConfig::default(),
            &default_tier_labels(),
        );
        assert_eq!(first, second);
    }
}
