//! Quality assessment seam.
//!
//! The pipeline never talks to a model provider directly; it goes
//! through the [`QualityOracle`] trait so assessments can come from an
//! HTTP-backed implementation, a canned test double, or nothing at all.
//! Oracle failures degrade the run instead of aborting it: a repository
//! whose assessment fails simply falls back to the neutral default at
//! estimation time.

use crate::cache::QualityCache;
use crate::domain::{RepositoryRecord, validate_quality_score};
use crate::error::Result;

/// Source of per-repository quality scores.
#[cfg_attr(test, mockall::automock)]
pub trait QualityOracle {
    /// Assess one repository.
    ///
    /// Returns `Ok(Some(score))` with a 0..=100 score, `Ok(None)` when
    /// the oracle declines to judge, or an error for transport and
    /// protocol failures.
    fn score(&self, record: &RepositoryRecord) -> Result<Option<f64>>;
}

/// Oracle that declines every assessment.
#[derive(Debug, Default, Clone)]
pub struct NullQualityOracle;

impl NullQualityOracle {
    /// Create a new no-op oracle.
    pub fn new() -> Self {
        Self
    }
}

impl QualityOracle for NullQualityOracle {
    fn score(&self, _record: &RepositoryRecord) -> Result<Option<f64>> {
        Ok(None)
    }
}

/// Records after quality assessment, plus any per-repository failures.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityAssessment {
    /// The input records with quality scores filled in where available.
    pub records: Vec<RepositoryRecord>,
    /// Human-readable descriptions of assessments that failed.
    pub oracle_errors: Vec<String>,
}

/// Fill in quality scores for every record, cheapest source first.
///
/// Resolution order per record: a score already on the record wins,
/// then a cache hit under the current fingerprint, then a fresh oracle
/// assessment. Fresh and pre-set scores are written back to the cache
/// whenever the record carries a fingerprint; the caller decides when
/// to flush. Oracle errors and out-of-range scores are collected, not
/// propagated.
pub fn apply_quality_scores<O>(
    records: Vec<RepositoryRecord>,
    oracle: &O,
    cache: &mut QualityCache,
) -> QualityAssessment
where
    O: QualityOracle + ?Sized,
{
    let mut oracle_errors = Vec::new();
    let records = records
        .into_iter()
        .map(|mut record| {
            let fingerprint = record.content_fingerprint.clone();

            if let Some(score) = record.quality_score {
                if let Some(fingerprint) = &fingerprint {
                    cache.put(record.name.clone(), fingerprint.clone(), score);
                }
                return record;
            }

            if let Some(score) = cache.get(&record.name, fingerprint.as_deref()) {
                record.quality_score = Some(score);
                return record;
            }

            match oracle.score(&record) {
                Ok(Some(raw)) => match validate_quality_score(raw) {
                    Ok(score) => {
                        record.quality_score = Some(score);
                        if let Some(fingerprint) = &fingerprint {
                            cache.put(record.name.clone(), fingerprint.clone(), score);
                        }
                    }
                    Err(err) => oracle_errors.push(format!("{}: {err}", record.name)),
                },
                Ok(None) => {}
                Err(err) => oracle_errors.push(format!("{}: {err}", record.name)),
            }
            record
        })
        .collect();

    QualityAssessment {
        records,
        oracle_errors,
    }
}
