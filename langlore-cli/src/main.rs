#![deny(missing_docs)]
//! Langlore command-line interface.
//!
//! Fetches repository statistics from GitHub, scores per-language
//! proficiency, and renders profile-README markdown and JSON reports.

mod github;
mod oracle;

use clap::{Args, Parser, Subcommand};
use github::{GithubClient, RepoSummary};
use langlore_core::{
    AnalyzerConfig, NullQualityOracle, QualityCache, QualityOracle, RankingReport, RenderOptions,
    RepositoryRecord, apply_quality_scores, build_report, estimate_volumes, format_thousands,
    render_json, render_profile_markdown,
};
use oracle::{LlmQualityOracle, OracleConfig};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser)]
#[command(name = "langlore", version, about = "GitHub language proficiency profiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct AccountArgs {
    /// GitHub login to analyze.
    #[arg(long)]
    user: String,
    /// GitHub API token for authenticated requests.
    #[arg(long, env = "GITHUB_TOKEN")]
    token: Option<String>,
}

#[derive(Args, Clone)]
struct FetchArgs {
    /// Maximum number of concurrent repository fetches.
    #[arg(short = 'j', long, default_value_t = 5)]
    concurrency: usize,
    /// Organizations to scan for contributed repositories (repeatable or comma-separated).
    #[arg(long, value_delimiter = ',')]
    include_org: Vec<String>,
}

#[derive(Args, Clone)]
struct FilterArgs {
    /// Configuration file with exclusions, weights, and thresholds.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Additional languages to exclude (repeatable or comma-separated).
    #[arg(long, value_delimiter = ',')]
    exclude_lang: Vec<String>,
    /// Additional repositories to exclude (repeatable or comma-separated).
    #[arg(long, value_delimiter = ',')]
    exclude_repo: Vec<String>,
    /// Minimum attributed commits for a language to rank.
    #[arg(long)]
    min_commits: Option<u64>,
    /// Minimum total volume for a language to rank.
    #[arg(long)]
    min_volume: Option<u64>,
    /// Number of ranked languages to keep.
    #[arg(long)]
    top_n: Option<usize>,
}

#[derive(Args, Clone)]
struct OracleArgs {
    /// Chat-completions URL for code quality assessment.
    #[arg(long)]
    oracle_url: Option<String>,
    /// API key for the oracle endpoint.
    #[arg(long, env = "LANGLORE_ORACLE_KEY")]
    oracle_key: Option<String>,
    /// Model requested from the oracle endpoint.
    #[arg(long, default_value = "gpt-4o-mini")]
    oracle_model: String,
    /// Disable quality assessment even if an oracle URL is configured.
    #[arg(long)]
    no_oracle: bool,
}

#[derive(Args, Clone)]
struct OutputArgs {
    /// JSON report file to write.
    #[arg(long, default_value = "language_ranking.json")]
    json_output: PathBuf,
    /// Markdown report file to write.
    #[arg(long, default_value = "language_ranking.md")]
    markdown_output: PathBuf,
    /// Quality score cache file.
    #[arg(long, default_value = ".langlore-cache.json")]
    cache_path: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch repositories, score languages, and write the profile reports.
    Analyze {
        #[command(flatten)]
        account: AccountArgs,
        #[command(flatten)]
        fetch: FetchArgs,
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        oracle: OracleArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Re-render profile markdown from a saved report JSON.
    Render {
        /// Report JSON produced by a previous analyze run.
        #[arg(long, default_value = "language_ranking.json")]
        input: PathBuf,
        /// Markdown file to write.
        #[arg(long, default_value = "language_ranking.md")]
        output: PathBuf,
    },
    /// Inspect or clear the quality score cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// List cached quality scores.
    Show {
        /// Quality score cache file.
        #[arg(long, default_value = ".langlore-cache.json")]
        cache_path: PathBuf,
    },
    /// Delete every cached quality score.
    Clear {
        /// Quality score cache file.
        #[arg(long, default_value = ".langlore-cache.json")]
        cache_path: PathBuf,
    },
}

#[cfg(not(test))]
#[tokio::main]
async fn main() -> CliResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            account,
            fetch,
            filters,
            oracle,
            output,
        } => run_analyze(account, fetch, filters, oracle, output).await?,
        Commands::Render { input, output } => run_render(&input, &output).await?,
        Commands::Cache { action } => run_cache(action)?,
    }

    Ok(())
}

#[cfg(test)]
fn main() {}

async fn run_analyze(
    account: AccountArgs,
    fetch: FetchArgs,
    filters: FilterArgs,
    oracle: OracleArgs,
    output: OutputArgs,
) -> CliResult<()> {
    let mut config = match &filters.config {
        Some(path) => AnalyzerConfig::from_json_file(path)?,
        None => AnalyzerConfig::default(),
    };
    apply_filter_overrides(&mut config, &filters, &fetch.include_org);
    config.validate()?;

    let client = Arc::new(GithubClient::new(account.token.clone())?);
    log::info!("analyzing repositories for user: {}", account.user);

    let mut summaries = Vec::new();
    let owned = filter_repositories(
        client.list_user_repositories(&account.user).await?,
        &config.excluded_repositories,
    );
    summaries.extend(owned.into_iter().map(|summary| (summary, false)));

    for org in &config.included_organizations {
        match client.list_org_repositories(org).await {
            Ok(repos) => {
                let repos = filter_repositories(repos, &config.excluded_repositories);
                summaries.extend(repos.into_iter().map(|summary| (summary, true)));
            }
            Err(err) => log::warn!("skipping organization {org}: {err}"),
        }
    }
    log::info!("found {} repositories", summaries.len());

    let records =
        fetch_records(client, account.user.clone(), summaries, fetch.concurrency).await?;

    let oracle_config = resolve_oracle_config(&oracle);
    let cache_path = output.cache_path.clone();
    let (records, oracle_errors, cache) =
        tokio::task::spawn_blocking(move || assess_quality(records, oracle_config, cache_path))
            .await??;
    for error in &oracle_errors {
        log::warn!("quality assessment failed for {error}");
    }
    if let Err(err) = cache.flush() {
        log::warn!("could not write quality cache: {err}");
    }

    let report = build_report(&records, &config);

    let json = render_json(&report)?;
    write_output(&output.json_output, json).await?;
    let markdown = render_profile_markdown(
        &report,
        &RenderOptions {
            generated_at: Some(current_timestamp()),
            bar_width: 20,
        },
    );
    write_output(&output.markdown_output, markdown).await?;

    print!(
        "{}",
        render_console_summary(&report, &output.json_output, &output.markdown_output)
    );
    Ok(())
}

async fn run_render(input: &Path, output: &Path) -> CliResult<()> {
    let contents = tokio::fs::read_to_string(input).await?;
    let report: RankingReport = serde_json::from_str(&contents)?;
    let markdown = render_profile_markdown(
        &report,
        &RenderOptions {
            generated_at: Some(current_timestamp()),
            bar_width: 20,
        },
    );
    write_output(output, markdown).await?;
    println!("Rendered {} from {}", output.display(), input.display());
    Ok(())
}

fn run_cache(action: CacheAction) -> CliResult<()> {
    match action {
        CacheAction::Show { cache_path } => {
            let cache = QualityCache::load(&cache_path);
            if cache.is_empty() {
                println!("Quality cache is empty.");
                return Ok(());
            }
            println!(
                "{} cached assessment(s) in {}:",
                cache.len(),
                cache_path.display()
            );
            for (repository, entry) in cache.entries() {
                println!(
                    "- {repository}: {:.1} (fingerprint {})",
                    entry.quality_score, entry.fingerprint
                );
            }
        }
        CacheAction::Clear { cache_path } => {
            let mut cache = QualityCache::load(&cache_path);
            let removed = cache.len();
            cache.clear();
            cache.flush()?;
            println!("Cleared {removed} cached assessment(s).");
        }
    }
    Ok(())
}

/// Merge command-line filter flags over the loaded configuration.
fn apply_filter_overrides(config: &mut AnalyzerConfig, filters: &FilterArgs, orgs: &[String]) {
    config
        .excluded_languages
        .extend(filters.exclude_lang.iter().cloned());
    config
        .excluded_repositories
        .extend(filters.exclude_repo.iter().cloned());
    for org in orgs {
        if !config.included_organizations.contains(org) {
            config.included_organizations.push(org.clone());
        }
    }
    if let Some(min_commits) = filters.min_commits {
        config.proficiency.min_commits = min_commits;
    }
    if let Some(min_volume) = filters.min_volume {
        config.proficiency.min_volume = min_volume;
    }
    if let Some(top_n) = filters.top_n {
        config.top_n = top_n;
    }
}

/// Drop forks and explicitly excluded repositories.
fn filter_repositories(summaries: Vec<RepoSummary>, excluded: &[String]) -> Vec<RepoSummary> {
    summaries
        .into_iter()
        .filter(|summary| !summary.fork && !excluded.iter().any(|name| name == &summary.name))
        .collect()
}

fn resolve_oracle_config(args: &OracleArgs) -> Option<OracleConfig> {
    if args.no_oracle {
        return None;
    }
    let url = args.oracle_url.clone()?;
    Some(OracleConfig {
        url,
        api_key: args.oracle_key.clone(),
        model: args.oracle_model.clone(),
    })
}

/// Fill in quality scores from the cache and, when configured, the oracle.
///
/// Runs on a blocking thread: the oracle client is synchronous and cache
/// I/O touches the filesystem.
fn assess_quality(
    records: Vec<RepositoryRecord>,
    oracle_config: Option<OracleConfig>,
    cache_path: PathBuf,
) -> CliResult<(Vec<RepositoryRecord>, Vec<String>, QualityCache)> {
    let mut cache = QualityCache::load(&cache_path);
    let oracle: Box<dyn QualityOracle + Send + Sync> = match oracle_config {
        Some(config) => Box::new(LlmQualityOracle::new(config)?),
        None => Box::new(NullQualityOracle::new()),
    };
    let assessment = apply_quality_scores(records, oracle.as_ref(), &mut cache);
    Ok((assessment.records, assessment.oracle_errors, cache))
}

async fn fetch_records(
    client: Arc<GithubClient>,
    user: String,
    summaries: Vec<(RepoSummary, bool)>,
    concurrency: usize,
) -> CliResult<Vec<RepositoryRecord>> {
    let concurrency = if concurrency == 0 { 1 } else { concurrency };
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut tasks = JoinSet::new();

    for (summary, from_org) in summaries {
        let permit = semaphore.clone().acquire_owned().await?;
        let client = client.clone();
        let user = user.clone();
        tasks.spawn(async move {
            let _permit = permit;
            let name = summary.name.clone();
            (name, fetch_record(client, user, summary, from_org).await)
        });
    }

    let mut records = Vec::new();
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok((_, Ok(Some(record)))) => records.push(record),
            Ok((_, Ok(None))) => {}
            Ok((name, Err(err))) => log::warn!("skipping {name}: {err}"),
            Err(err) => log::warn!("repository task failed: {err}"),
        }
    }
    records.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(records)
}

/// Fetch everything needed to build one repository record.
///
/// Individual endpoint failures degrade the record instead of failing
/// the run. Organization repositories without commits authored by the
/// user are dropped entirely.
async fn fetch_record(
    client: Arc<GithubClient>,
    user: String,
    summary: RepoSummary,
    from_org: bool,
) -> CliResult<Option<RepositoryRecord>> {
    let owner = summary.owner.login.clone();
    let name = summary.name.clone();

    let commit_count = match client.commit_count(&owner, &name, &user).await {
        Ok(count) => count,
        Err(err) => {
            log::warn!("commit count unavailable for {owner}/{name}: {err}");
            0
        }
    };
    if from_org && commit_count == 0 {
        return Ok(None);
    }

    let languages = match client.languages(&owner, &name).await {
        Ok(languages) if !languages.is_empty() => languages,
        Ok(_) => {
            let branch = summary
                .default_branch
                .clone()
                .unwrap_or_else(|| "HEAD".to_string());
            let paths = match client.tree_paths(&owner, &name, &branch).await {
                Ok(paths) => paths,
                Err(err) => {
                    log::warn!("tree unavailable for {owner}/{name}: {err}");
                    Vec::new()
                }
            };
            estimate_volumes(summary.language.as_deref(), &paths)
        }
        Err(err) => {
            log::warn!("languages unavailable for {owner}/{name}: {err}");
            estimate_volumes(summary.language.as_deref(), &[])
        }
    };
    if languages.is_empty() {
        log::info!("no language data for {owner}/{name}");
    }

    let fingerprint = match client.latest_commit_sha(&owner, &name).await {
        Ok(Some(sha)) => Some(sha),
        Ok(None) => summary.pushed_at.clone(),
        Err(err) => {
            log::warn!("fingerprint unavailable for {owner}/{name}: {err}");
            summary.pushed_at.clone()
        }
    };

    let mut record = RepositoryRecord::new(&name, languages)?.with_commit_count(commit_count);
    if from_org {
        record = record.as_contribution();
    }
    if let Some(fingerprint) = fingerprint {
        record = record.with_fingerprint(fingerprint);
    }
    Ok(Some(record))
}

async fn write_output(path: &Path, contents: String) -> CliResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, contents).await?;
    Ok(())
}

fn current_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M UTC").to_string()
}

fn render_console_summary(
    report: &RankingReport,
    json_path: &Path,
    markdown_path: &Path,
) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Analysis complete!");
    let _ = writeln!(
        output,
        "Generated {} and {}",
        json_path.display(),
        markdown_path.display()
    );
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Total repositories analyzed: {}",
        report.total_repositories
    );
    let _ = writeln!(output, "Owned repositories: {}", report.owned_repositories);
    let _ = writeln!(
        output,
        "Contributed repositories: {}",
        report.contributed_repositories
    );
    if !report.excluded_repositories.is_empty() {
        let _ = writeln!(
            output,
            "Excluded repositories: {}",
            report.excluded_repositories.join(", ")
        );
    }

    if report.ranking.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "No language data available.");
        return output;
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Top 5 languages:");
    for (position, row) in report.ranking.iter().take(5).enumerate() {
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
        let _ = writeln!(
            output,
            "{}. {}: {:.1}% ({} bytes, {} repos) [{}]",
            position + 1,
            row.language,
            row.usage_percentage,
            format_thousands(volume),
            repo_count,
            row.tier_label
        );
    }
    output
}

#[cfg(test)]
mod tests {
    use super::{
        AnalyzerConfig, FilterArgs, OracleArgs, RepoSummary, apply_filter_overrides,
        filter_repositories, render_console_summary, resolve_oracle_config,
    };
    use langlore_core::{LanguageVolumes, RepositoryRecord, build_report};
    use std::path::Path;

    fn summary(name: &str, fork: bool) -> RepoSummary {
        RepoSummary {
            name: name.to_string(),
            fork,
            owner: super::github::RepoOwner {
                login: "octo".to_string(),
            },
            language: None,
            default_branch: Some("main".to_string()),
            pushed_at: None,
        }
    }

    fn filter_args() -> FilterArgs {
        FilterArgs {
            config: None,
            exclude_lang: Vec::new(),
            exclude_repo: Vec::new(),
            min_commits: None,
            min_volume: None,
            top_n: None,
        }
    }

    #[test]
    fn filter_repositories_drops_forks_and_excluded() {
        let summaries = vec![
            summary("keep", false),
            summary("forked", true),
            summary("banned", false),
        ];
        let filtered = filter_repositories(summaries, &["banned".to_string()]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "keep");
    }

    #[test]
    fn filter_overrides_merge_into_config() {
        let mut config = AnalyzerConfig::default();
        let filters = FilterArgs {
            exclude_lang: vec!["Vim Script".to_string()],
            exclude_repo: vec!["dotfiles".to_string()],
            min_commits: Some(8),
            top_n: Some(3),
            ..filter_args()
        };

        apply_filter_overrides(&mut config, &filters, &["acme".to_string()]);

        assert!(config.excluded_languages.contains("Vim Script"));
        assert!(config.excluded_languages.contains("HTML"));
        assert_eq!(config.excluded_repositories, vec!["dotfiles".to_string()]);
        assert_eq!(config.included_organizations, vec!["acme".to_string()]);
        assert_eq!(config.proficiency.min_commits, 8);
        assert_eq!(config.proficiency.min_volume, 100);
        assert_eq!(config.top_n, 3);
    }

    #[test]
    fn duplicate_orgs_are_not_added_twice() {
        let mut config = AnalyzerConfig {
            included_organizations: vec!["acme".to_string()],
            ..AnalyzerConfig::default()
        };
        apply_filter_overrides(&mut config, &filter_args(), &["acme".to_string()]);
        assert_eq!(config.included_organizations.len(), 1);
    }

    #[test]
    fn oracle_config_requires_a_url_and_honors_no_oracle() {
        let base = OracleArgs {
            oracle_url: Some("https://llm.example/v1/chat/completions".to_string()),
            oracle_key: Some("sk-test".to_string()),
            oracle_model: "quality-judge".to_string(),
            no_oracle: false,
        };

        let config = resolve_oracle_config(&base).expect("config");
        assert_eq!(config.url, "https://llm.example/v1/chat/completions");
        assert_eq!(config.model, "quality-judge");

        let disabled = OracleArgs {
            no_oracle: true,
            ..base.clone()
        };
        assert!(resolve_oracle_config(&disabled).is_none());

        let missing_url = OracleArgs {
            oracle_url: None,
            ..base
        };
        assert!(resolve_oracle_config(&missing_url).is_none());
    }

    #[test]
    fn console_summary_lists_top_languages_with_tiers() {
        let languages: LanguageVolumes = [("Rust".to_string(), 9_000u64)].into_iter().collect();
        let records = vec![
            RepositoryRecord::new("engine", languages)
                .expect("record")
                .with_commit_count(40),
        ];
        let report = build_report(&records, &AnalyzerConfig::default());

        let summary = render_console_summary(
            &report,
            Path::new("language_ranking.json"),
            Path::new("language_ranking.md"),
        );

        assert!(summary.contains("Analysis complete!"));
        assert!(summary.contains("Total repositories analyzed: 1"));
        assert!(summary.contains("Top 5 languages:"));
        assert!(summary.contains("1. Rust: 100.0% (9,000 bytes, 1 repos)"));
        assert!(summary.contains('['));
    }

    #[test]
    fn console_summary_handles_empty_reports() {
        let report = build_report(&[], &AnalyzerConfig::default());
        let summary = render_console_summary(
            &report,
            Path::new("language_ranking.json"),
            Path::new("language_ranking.md"),
        );
        assert!(summary.contains("No language data available."));
        assert!(!summary.contains("Top 5 languages:"));
    }
}
