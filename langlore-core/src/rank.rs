//! Ranking of languages by blended usage and proficiency.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::config::RankingConfig;
use crate::domain::RankedLanguage;

/// Two scores closer than this are treated as equal when ordering.
pub const SCORE_EPSILON: f64 = 1e-9;

/// Map a 0..=100 score onto one of the ordered tier labels.
///
/// The score range is divided into `labels.len()` equal buckets; 100
/// lands in the top bucket. Out-of-range scores clamp to the nearest
/// end of the ladder.
pub fn tier_label(score: f64, labels: &[String]) -> String {
    let Some(last) = labels.last() else {
        return String::new();
    };
    let clamped = score.clamp(0.0, 100.0);
    let span = 100.0 / labels.len() as f64;
    let index = (clamped / span).floor() as usize;
    labels.get(index).unwrap_or(last).clone()
}

/// Produce the ranked language list, best first.
///
/// Each language contributes a combined score of
/// `usage * usage_weight + proficiency * proficiency_weight`. Ties
/// within [`SCORE_EPSILON`] fall back to usage, then to ascending
/// language name so equal rows always come out in a stable order.
/// Languages absent from `proficiency` (filtered by the activity
/// floors) rank on usage alone with a zero proficiency contribution.
pub fn rank(
    usage: &BTreeMap<String, f64>,
    proficiency: &BTreeMap<String, f64>,
    config: &RankingConfig,
    top_n: usize,
) -> Vec<RankedLanguage> {
    let mut rows: Vec<RankedLanguage> = usage
        .iter()
        .map(|(language, &usage_percentage)| {
            let proficiency_score = proficiency.get(language).copied().unwrap_or(0.0);
            let combined_score = usage_percentage * config.usage_weight
                + proficiency_score * config.proficiency_weight;
            RankedLanguage {
                language: language.clone(),
                combined_score,
                usage_percentage,
                tier_label: tier_label(proficiency_score, &config.tier_labels),
            }
        })
        .collect();

    rows.sort_by(|a, b| compare_rows(a, b));
    rows.truncate(top_n);
    rows
}

fn compare_rows(a: &RankedLanguage, b: &RankedLanguage) -> Ordering {
    match descending_with_epsilon(a.combined_score, b.combined_score) {
        Ordering::Equal => match descending_with_epsilon(a.usage_percentage, b.usage_percentage) {
            Ordering::Equal => a.language.cmp(&b.language),
            ordering => ordering,
        },
        ordering => ordering,
    }
}

fn descending_with_epsilon(a: f64, b: f64) -> Ordering {
    if (a - b).abs() <= SCORE_EPSILON {
        Ordering::Equal
    } else if a > b {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}
