//! Report assembly and rendering.
//!
//! [`build_report`] runs the whole scoring pipeline over materialized
//! repository records and produces a [`RankingReport`]; the renderers
//! turn that report into profile-README markdown or pretty JSON. Both
//! renderers are pure so the same report always yields the same bytes.

use std::collections::BTreeMap;
use std::fmt::Write;

use serde::Serialize;

use crate::aggregate::{aggregate, usage_percentages};
use crate::config::AnalyzerConfig;
use crate::domain::{RankingReport, RepositoryRecord};
use crate::estimate::estimate;
use crate::rank::rank;

/// Options for markdown rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Timestamp for the footer; `None` omits the footer entirely.
    pub generated_at: Option<String>,
    /// Width of the progress bars, in characters.
    pub bar_width: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            generated_at: None,
            bar_width: 20,
        }
    }
}

/// Run the full analysis pipeline and assemble the report.
///
/// Deterministic: identical records and configuration always produce an
/// identical report, whatever order the records arrive in.
pub fn build_report(records: &[RepositoryRecord], config: &AnalyzerConfig) -> RankingReport {
    let aggregates = aggregate(records, &config.excluded_languages);
    let language_percentages = usage_percentages(&aggregates);
    let proficiency = estimate(&aggregates, &config.proficiency, &config.ranking.tier_labels);

    let proficiency_scores: BTreeMap<String, f64> = proficiency
        .iter()
        .map(|(language, entry)| (language.clone(), entry.proficiency_score))
        .collect();
    let ranking = rank(
        &language_percentages,
        &proficiency_scores,
        &config.ranking,
        config.top_n,
    );

    let mut language_stats = BTreeMap::new();
    let mut language_repositories = BTreeMap::new();
    let mut language_commits = BTreeMap::new();
    for (language, aggregate) in &aggregates {
        language_stats.insert(language.clone(), aggregate.total_volume);
        language_repositories.insert(
            language.clone(),
            aggregate.repository_set.iter().cloned().collect::<Vec<_>>(),
        );
        language_commits.insert(language.clone(), aggregate.total_commits);
    }

    RankingReport {
        total_repositories: records.len(),
        owned_repositories: records.iter().filter(|record| record.owned).count(),
        contributed_repositories: records.iter().filter(|record| record.contributor).count(),
        language_stats,
        language_percentages,
        language_repositories,
        language_commits,
        ranking,
        proficiency,
        excluded_languages: config.excluded_languages.iter().cloned().collect(),
        excluded_repositories: config.excluded_repositories.clone(),
    }
}

/// Render the report as profile-README markdown.
pub fn render_profile_markdown(report: &RankingReport, options: &RenderOptions) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "## 🔥 Programming Language Rankings\n");
    let _ = writeln!(
        output,
        "*Based on analysis of {} repositories ({} owned + {} contributed)*\n",
        report.total_repositories, report.owned_repositories, report.contributed_repositories
    );

    if report.ranking.is_empty() {
        let _ = writeln!(output, "No language data available.");
        return output;
    }

    append_ranking_rows(&mut output, report, options.bar_width);
    append_proficiency_table(&mut output, report);
    append_badges(&mut output, report);
    append_commit_activity(&mut output, report, options.bar_width);

    if let Some(generated_at) = &options.generated_at {
        let _ = writeln!(output, "\n*Last updated: {generated_at}*");
    }
    output
}

/// Render any serializable report payload as JSON.
pub fn render_json<T: Serialize + ?Sized>(payload: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(payload)
}

fn append_ranking_rows(output: &mut String, report: &RankingReport, bar_width: usize) {
    for (position, row) in report.ranking.iter().enumerate() {
        let volume = report
            .language_stats
            .get(&row.language)
            .copied()
            .unwrap_or(0);
        let repo_count = report
            .language_repositories
            .get(&row.language)
            .map(Vec::len)
            .unwrap_or(0);
        let bar = usage_bar(row.usage_percentage, bar_width);

        let _ = writeln!(
            output,
            "{}. **{}** - {:.1}% ({} repos)",
            position + 1,
            row.language,
            row.usage_percentage,
            repo_count
        );
        let _ = writeln!(output, "   `{bar}` {} bytes\n", format_thousands(volume));
    }
}

fn append_proficiency_table(output: &mut String, report: &RankingReport) {
    let _ = writeln!(output, "### Proficiency\n");
    let _ = writeln!(output, "| # | Language | Tier | Score | Usage |");
    let _ = writeln!(output, "|---|----------|------|-------|-------|");
    for (position, row) in report.ranking.iter().enumerate() {
        match report.proficiency.get(&row.language) {
            Some(entry) => {
                let _ = writeln!(
                    output,
                    "| {} | {} | {} | {:.1} | {:.1}% |",
                    position + 1,
                    row.language,
                    entry.tier_label,
                    entry.proficiency_score,
                    entry.usage_percentage
                );
            }
            None => {
                let _ = writeln!(
                    output,
                    "| {} | {} | n/a | n/a | {:.1}% |",
                    position + 1,
                    row.language,
                    row.usage_percentage
                );
            }
        }
    }
    let _ = writeln!(output);
}

fn append_badges(output: &mut String, report: &RankingReport) {
    let _ = writeln!(output, "### Languages\n");
    let badges: Vec<String> = report
        .ranking
        .iter()
        .map(|row| {
            format!(
                "![{}]({})",
                row.language,
                badge_url(&row.language, badge_color(&row.language))
            )
        })
        .collect();
    let _ = writeln!(output, "{}\n", badges.join(" "));
}

fn append_commit_activity(output: &mut String, report: &RankingReport, bar_width: usize) {
    let _ = writeln!(output, "### Commit Activity\n");
    let max_commits = report
        .ranking
        .iter()
        .filter_map(|row| report.language_commits.get(&row.language))
        .copied()
        .max()
        .unwrap_or(0);
    for row in &report.ranking {
        let commits = report
            .language_commits
            .get(&row.language)
            .copied()
            .unwrap_or(0);
        let bar = commit_bar(commits, max_commits, bar_width);
        let _ = writeln!(
            output,
            "- **{}**: `{bar}` {} commits",
            row.language,
            format_thousands(commits)
        );
    }
    let _ = writeln!(output);
}

/// Build a shields.io static badge URL for a language.
///
/// Shields treats `-` and `_` as separators inside the path, so they
/// are doubled before percent-encoding the rest.
pub fn badge_url(language: &str, color: &str) -> String {
    let escaped = language.replace('-', "--").replace('_', "__");
    let encoded = urlencoding::encode(&escaped);
    format!("https://img.shields.io/badge/{encoded}-{color}?style=flat-square")
}

/// Badge color for a language, loosely following linguist's palette.
pub fn badge_color(language: &str) -> &'static str {
    match language {
        "Rust" => "dea584",
        "Java" => "b07219",
        "Python" => "3572A5",
        "TypeScript" => "3178c6",
        "JavaScript" => "f1e05a",
        "Go" => "00ADD8",
        "C++" => "f34b7d",
        "C" => "555555",
        "C#" => "178600",
        "Dart" => "00B4AB",
        "Kotlin" => "A97BFF",
        "Swift" => "F05138",
        "Ruby" => "701516",
        "PHP" => "4F5D95",
        "Shell" => "89e051",
        "Vue" => "41b883",
        "SCSS" => "c6538c",
        "HTML" => "e34c26",
        "CSS" => "663399",
        _ => "808080",
    }
}

fn usage_bar(percentage: f64, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let filled = ((percentage / 100.0 * width as f64) as usize).clamp(1, width);
    bar_string(filled, width)
}

fn commit_bar(commits: u64, max_commits: u64, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    if commits == 0 || max_commits == 0 {
        return bar_string(0, width);
    }
    let filled = ((commits as f64 / max_commits as f64 * width as f64) as usize).clamp(1, width);
    bar_string(filled, width)
}

fn bar_string(filled: usize, width: usize) -> String {
    let mut bar = "█".repeat(filled);
    bar.push_str(&"░".repeat(width - filled));
    bar
}

/// Format an integer with thousands separators.
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(digit);
    }
    formatted
}
