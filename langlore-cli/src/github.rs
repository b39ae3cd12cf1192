//! GitHub REST API data source.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use crate::CliResult;

const GITHUB_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "langlore-cli";
const PAGE_SIZE: usize = 100;
const MAX_RETRIES: usize = 2;
const RETRY_DELAY_MS: u64 = 500;

/// Repository summary from the list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoSummary {
    /// Repository name.
    pub name: String,
    /// Whether the repository is a fork.
    #[serde(default)]
    pub fork: bool,
    /// Owning account.
    pub owner: RepoOwner,
    /// Primary language reported by GitHub, if any.
    #[serde(default)]
    pub language: Option<String>,
    /// Default branch name.
    #[serde(default)]
    pub default_branch: Option<String>,
    /// Timestamp of the last push.
    #[serde(default)]
    pub pushed_at: Option<String>,
}

/// Owning account of a repository.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoOwner {
    /// Account login.
    pub login: String,
}

#[derive(Debug, Deserialize)]
struct CommitSummary {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeEntry>,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Client for the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl GithubClient {
    /// Build a client against the public GitHub API.
    pub fn new(token: Option<String>) -> CliResult<Self> {
        Self::with_base_url(GITHUB_API_BASE, token)
    }

    /// Build a client against a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>, token: Option<String>) -> CliResult<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// List every non-paginated-away repository of a user.
    pub async fn list_user_repositories(&self, user: &str) -> CliResult<Vec<RepoSummary>> {
        self.list_paginated(&format!("{}/users/{user}/repos", self.base_url))
            .await
    }

    /// List every repository of an organization.
    pub async fn list_org_repositories(&self, org: &str) -> CliResult<Vec<RepoSummary>> {
        self.list_paginated(&format!("{}/orgs/{org}/repos", self.base_url))
            .await
    }

    async fn list_paginated(&self, url: &str) -> CliResult<Vec<RepoSummary>> {
        let mut repos = Vec::new();
        let mut page = 1usize;
        loop {
            let response = self
                .get(
                    url,
                    &[
                        ("per_page", PAGE_SIZE.to_string()),
                        ("page", page.to_string()),
                    ],
                )
                .await?;
            let response = check_status(response).await?;
            let batch: Vec<RepoSummary> = response.json().await?;
            let last_page = batch.len() < PAGE_SIZE;
            repos.extend(batch);
            if last_page {
                break;
            }
            page += 1;
        }
        Ok(repos)
    }

    /// Fetch the per-language byte map of a repository.
    pub async fn languages(&self, owner: &str, repo: &str) -> CliResult<BTreeMap<String, u64>> {
        let url = format!("{}/repos/{owner}/{repo}/languages", self.base_url);
        let response = check_status(self.get(&url, &[]).await?).await?;
        Ok(response.json().await?)
    }

    /// Count commits authored by `author` in a repository.
    ///
    /// Requests one commit per page and reads the total from the
    /// `Link` header's `rel="last"` page number. A missing header means
    /// everything fit on one page; 409 means the repository is empty.
    pub async fn commit_count(&self, owner: &str, repo: &str, author: &str) -> CliResult<u64> {
        let url = format!("{}/repos/{owner}/{repo}/commits", self.base_url);
        let response = self
            .get(
                &url,
                &[
                    ("author", author.to_string()),
                    ("per_page", "1".to_string()),
                ],
            )
            .await?;
        if response.status() == StatusCode::CONFLICT {
            return Ok(0);
        }
        let response = check_status(response).await?;

        let link = response
            .headers()
            .get(reqwest::header::LINK)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        if let Some(last_page) = link.as_deref().and_then(parse_last_page) {
            return Ok(last_page);
        }

        let commits: Vec<CommitSummary> = response.json().await?;
        Ok(commits.len() as u64)
    }

    /// Latest commit hash of the default branch, used as a content
    /// fingerprint. `None` for empty repositories.
    pub async fn latest_commit_sha(&self, owner: &str, repo: &str) -> CliResult<Option<String>> {
        let url = format!("{}/repos/{owner}/{repo}/commits", self.base_url);
        let response = self.get(&url, &[("per_page", "1".to_string())]).await?;
        if response.status() == StatusCode::CONFLICT {
            return Ok(None);
        }
        let response = check_status(response).await?;
        let commits: Vec<CommitSummary> = response.json().await?;
        Ok(commits.into_iter().next().map(|commit| commit.sha))
    }

    /// File paths from the recursive git tree of a branch.
    ///
    /// Unknown branches and empty repositories yield an empty list.
    pub async fn tree_paths(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> CliResult<Vec<String>> {
        let url = format!("{}/repos/{owner}/{repo}/git/trees/{branch}", self.base_url);
        let response = self.get(&url, &[("recursive", "1".to_string())]).await?;
        if matches!(
            response.status(),
            StatusCode::NOT_FOUND | StatusCode::CONFLICT
        ) {
            return Ok(Vec::new());
        }
        let response = check_status(response).await?;
        let tree: TreeResponse = response.json().await?;
        Ok(tree
            .tree
            .into_iter()
            .filter(|entry| entry.kind == "blob")
            .map(|entry| entry.path)
            .collect())
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> CliResult<Response> {
        let mut attempt = 0usize;
        loop {
            let mut request = self
                .client
                .get(url)
                .query(query)
                .header("Accept", "application/vnd.github+json");
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }
            match request.send().await {
                Ok(response) if retryable_status(response.status()) && attempt < MAX_RETRIES => {}
                Ok(response) => return Ok(response),
                Err(_) if attempt < MAX_RETRIES => {}
                Err(err) => return Err(err.into()),
            }
            attempt += 1;
            tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64)).await;
        }
    }
}

fn retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

async fn check_status(response: Response) -> CliResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(format!("github api error ({status}) for {url}: {body}").into())
}

/// Extract the `rel="last"` page number from a `Link` header.
fn parse_last_page(link_header: &str) -> Option<u64> {
    link_header.split(',').find_map(|part| {
        let (url_part, rel_part) = part.split_once(';')?;
        if !rel_part.contains("rel=\"last\"") {
            return None;
        }
        let url = url_part.trim().trim_start_matches('<').trim_end_matches('>');
        let query = url.split_once('?')?.1;
        query.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            if key == "page" { value.parse().ok() } else { None }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::{GithubClient, parse_last_page};
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use serde_json::json;

    fn client_for(server: &MockServer) -> GithubClient {
        GithubClient::with_base_url(server.base_url(), Some("t0ken".to_string())).expect("client")
    }

    #[test]
    fn parse_last_page_reads_rel_last() {
        let header = "<https://api.github.com/repositories/1/commits?per_page=1&page=2>; \
                      rel=\"next\", \
                      <https://api.github.com/repositories/1/commits?per_page=1&page=347>; \
                      rel=\"last\"";
        assert_eq!(parse_last_page(header), Some(347));
    }

    #[test]
    fn parse_last_page_ignores_other_rels() {
        let header = "<https://api.github.com/x?page=9>; rel=\"prev\"";
        assert_eq!(parse_last_page(header), None);
        assert_eq!(parse_last_page(""), None);
    }

    #[tokio::test]
    async fn lists_repositories_across_pages() {
        let server = MockServer::start_async().await;
        let full_page: Vec<serde_json::Value> = (0..100)
            .map(|index| json!({"name": format!("repo-{index}"), "owner": {"login": "octo"}}))
            .collect();
        let first = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/users/octo/repos")
                    .query_param("page", "1");
                then.status(200).json_body(json!(full_page));
            })
            .await;
        let second = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/users/octo/repos")
                    .query_param("page", "2");
                then.status(200)
                    .json_body(json!([{"name": "tail", "owner": {"login": "octo"}}]));
            })
            .await;

        let repos = client_for(&server)
            .list_user_repositories("octo")
            .await
            .expect("repos");

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(repos.len(), 101);
        assert_eq!(repos[100].name, "tail");
        assert!(!repos[0].fork);
    }

    #[tokio::test]
    async fn sends_bearer_token_and_api_accept_header() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/octo/engine/languages")
                    .header("authorization", "Bearer t0ken")
                    .header("accept", "application/vnd.github+json");
                then.status(200).json_body(json!({"Rust": 9000}));
            })
            .await;

        let languages = client_for(&server)
            .languages("octo", "engine")
            .await
            .expect("languages");

        mock.assert_async().await;
        assert_eq!(languages.get("Rust"), Some(&9000));
    }

    #[tokio::test]
    async fn commit_count_uses_the_link_header() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/octo/engine/commits")
                    .query_param("author", "octo");
                then.status(200)
                    .header(
                        "Link",
                        "<http://x/repos/octo/engine/commits?per_page=1&page=42>; rel=\"last\"",
                    )
                    .json_body(json!([{"sha": "abc"}]));
            })
            .await;

        let count = client_for(&server)
            .commit_count("octo", "engine", "octo")
            .await
            .expect("count");
        assert_eq!(count, 42);
    }

    #[tokio::test]
    async fn commit_count_without_link_header_counts_the_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/tiny/commits");
                then.status(200).json_body(json!([{"sha": "abc"}]));
            })
            .await;

        let count = client_for(&server)
            .commit_count("octo", "tiny", "octo")
            .await
            .expect("count");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn commit_count_treats_empty_repository_as_zero() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/empty/commits");
                then.status(409).json_body(json!({"message": "Git Repository is empty."}));
            })
            .await;

        let count = client_for(&server)
            .commit_count("octo", "empty", "octo")
            .await
            .expect("count");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn latest_commit_sha_returns_first_commit() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/engine/commits");
                then.status(200).json_body(json!([{"sha": "f00dfeed"}]));
            })
            .await;

        let sha = client_for(&server)
            .latest_commit_sha("octo", "engine")
            .await
            .expect("sha");
        assert_eq!(sha.as_deref(), Some("f00dfeed"));
    }

    #[tokio::test]
    async fn latest_commit_sha_is_none_for_no_commits() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/bare/commits");
                then.status(200).json_body(json!([]));
            })
            .await;

        let sha = client_for(&server)
            .latest_commit_sha("octo", "bare")
            .await
            .expect("sha");
        assert_eq!(sha, None);
    }

    #[tokio::test]
    async fn tree_paths_keeps_only_blobs() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/octo/engine/git/trees/main")
                    .query_param("recursive", "1");
                then.status(200).json_body(json!({
                    "tree": [
                        {"path": "src", "type": "tree"},
                        {"path": "src/main.rs", "type": "blob"},
                        {"path": "README.md", "type": "blob"}
                    ]
                }));
            })
            .await;

        let paths = client_for(&server)
            .tree_paths("octo", "engine", "main")
            .await
            .expect("paths");
        assert_eq!(paths, vec!["src/main.rs".to_string(), "README.md".to_string()]);
    }

    #[tokio::test]
    async fn tree_paths_tolerates_missing_branches() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/engine/git/trees/gone");
                then.status(404).json_body(json!({"message": "Not Found"}));
            })
            .await;

        let paths = client_for(&server)
            .tree_paths("octo", "engine", "gone")
            .await
            .expect("paths");
        assert!(paths.is_empty());
    }

    #[tokio::test]
    async fn server_errors_are_retried_then_surfaced() {
        let server = MockServer::start_async().await;
        let failing = server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/flaky/languages");
                then.status(503).body("upstream unavailable");
            })
            .await;

        let result = client_for(&server).languages("octo", "flaky").await;

        // Initial attempt plus two retries.
        failing.assert_hits_async(3).await;
        let err = result.unwrap_err().to_string();
        assert!(err.contains("503"));
        assert!(err.contains("upstream unavailable"));
    }
}
