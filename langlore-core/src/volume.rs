//! Volume estimation for repositories without byte statistics.
//!
//! Some data sources report which languages a repository contains but
//! not how much of each. This module assigns every detected language a
//! typical project volume so such repositories still participate in
//! aggregation, just with coarse weights.

use std::collections::BTreeSet;
use std::path::Path;

use tokei::{Config, LanguageType};

use crate::domain::LanguageVolumes;

/// Volume assigned to languages without a dedicated estimate.
pub const DEFAULT_TYPICAL_VOLUME: u64 = 3_000;

/// Typical per-repository volume for a language, in bytes.
pub fn typical_volume(language: &str) -> u64 {
    match language {
        "Rust" => 15_000,
        "Java" | "Dart" => 12_000,
        "Vue" | "C++" => 10_000,
        "TypeScript" => 8_000,
        "CSS" => 6_000,
        "Jupyter Notebook" | "Jupyter Notebooks" => 5_000,
        "SCSS" => 4_000,
        "Makefile" => 1_000,
        _ => DEFAULT_TYPICAL_VOLUME,
    }
}

/// Classify a repository-relative file path into a language name.
pub fn classify_path(path: &str) -> Option<String> {
    LanguageType::from_path(Path::new(path), &Config::default())
        .map(|language| language.to_string())
}

/// Estimate per-language volumes for a repository.
///
/// Every distinct language detected in `tree_paths` contributes its
/// typical volume once. When classification finds nothing, the
/// reported primary language (if any) stands in alone; otherwise the
/// estimate is empty and the repository carries no language weight.
pub fn estimate_volumes(primary_language: Option<&str>, tree_paths: &[String]) -> LanguageVolumes {
    let detected: BTreeSet<String> = tree_paths
        .iter()
        .filter_map(|path| classify_path(path))
        .collect();

    if !detected.is_empty() {
        return detected
            .into_iter()
            .map(|language| {
                let volume = typical_volume(&language);
                (language, volume)
            })
            .collect();
    }

    match primary_language {
        Some(language) if !language.trim().is_empty() => {
            let mut volumes = LanguageVolumes::new();
            volumes.insert(language.to_string(), typical_volume(language));
            volumes
        }
        _ => LanguageVolumes::new(),
    }
}
