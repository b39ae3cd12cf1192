//! Account-wide language aggregation.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{LanguageAggregate, RepositoryRecord};

/// Reduce per-repository language volumes into account-wide totals.
///
/// Languages with empty names or listed in `excluded_languages` are
/// skipped. The fold is commutative, so output does not depend on record
/// order (quality samples retain input order, but only their mean is
/// consumed downstream). Empty input yields an empty map.
pub fn aggregate(
    records: &[RepositoryRecord],
    excluded_languages: &BTreeSet<String>,
) -> BTreeMap<String, LanguageAggregate> {
    let mut aggregates: BTreeMap<String, LanguageAggregate> = BTreeMap::new();

    for record in records {
        for (language, volume) in &record.languages {
            if language.is_empty() || excluded_languages.contains(language) {
                continue;
            }
            let aggregate = aggregates.entry(language.clone()).or_default();
            aggregate.total_volume += volume;
            aggregate.repository_set.insert(record.name.clone());
            aggregate.total_commits += record.attributed_commits(language);
            if let Some(score) = record.quality_score {
                aggregate.quality_samples.push(score);
            }
        }
    }

    aggregates
}

/// Usage share per language, in percent of the account-wide total volume.
///
/// Zero-volume languages are skipped: their percentage is undefined and
/// they are excluded from all downstream computation. The returned values
/// sum to roughly 100 whenever any volume exists.
pub fn usage_percentages(
    aggregates: &BTreeMap<String, LanguageAggregate>,
) -> BTreeMap<String, f64> {
    let total: u64 = aggregates.values().map(|a| a.total_volume).sum();
    if total == 0 {
        return BTreeMap::new();
    }

    aggregates
        .iter()
        .filter(|(_, aggregate)| aggregate.total_volume > 0)
        .map(|(language, aggregate)| {
            let share = aggregate.total_volume as f64 / total as f64 * 100.0;
            (language.clone(), share)
        })
        .collect()
}
