//! LLM-backed quality oracle.
//!
//! Talks to an OpenAI-compatible chat-completions endpoint and asks for
//! a single 0..=100 code quality score per repository. Runs on a
//! blocking client, so callers must keep it off the async runtime.

use langlore_core::{LangloreError, QualityOracle, RepositoryRecord};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;

use crate::CliResult;

const USER_AGENT: &str = "langlore-cli";
const SYSTEM_PROMPT: &str = "You are a strict code reviewer. Rate the overall code quality \
of the described repository on a scale from 0 to 100. Reply with only the number.";

/// Connection settings for the oracle endpoint.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Full chat-completions URL.
    pub url: String,
    /// Bearer token, if the endpoint requires one.
    pub api_key: Option<String>,
    /// Model identifier to request.
    pub model: String,
}

/// Quality oracle backed by a chat-completions API.
pub struct LlmQualityOracle {
    client: Client,
    config: OracleConfig,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl LlmQualityOracle {
    /// Build an oracle client for the configured endpoint.
    pub fn new(config: OracleConfig) -> CliResult<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client, config })
    }
}

impl QualityOracle for LlmQualityOracle {
    fn score(&self, record: &RepositoryRecord) -> langlore_core::Result<Option<f64>> {
        let payload = json!({
            "model": self.config.model,
            "temperature": 0,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": describe_repository(record)}
            ]
        });

        let mut request = self.client.post(&self.config.url).json(&payload);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }
        let response = request
            .send()
            .map_err(|err| LangloreError::Other(format!("oracle request failed: {err}")))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(LangloreError::Other(format!(
                "oracle api error ({status}): {body}"
            )));
        }
        let parsed: ChatResponse = response
            .json()
            .map_err(|err| LangloreError::Other(format!("oracle response decode failed: {err}")))?;

        let Some(content) = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
        else {
            return Ok(None);
        };
        Ok(parse_score(&content))
    }
}

fn describe_repository(record: &RepositoryRecord) -> String {
    let languages = record
        .languages
        .keys()
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Repository: {}\nLanguages: {}\nCommits: {}",
        record.name,
        if languages.is_empty() {
            "unknown".to_string()
        } else {
            languages
        },
        record.commit_count
    )
}

/// Pull the first number out of a model reply.
///
/// Accepts bare numbers ("85", "Score: 72.5") and x-out-of-ten forms
/// ("8/10" scales to 80). Out-of-range values are treated as a declined
/// assessment rather than an error.
fn parse_score(content: &str) -> Option<f64> {
    let start = content.find(|c: char| c.is_ascii_digit())?;
    let rest = &content[start..];
    let end = rest
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit() && *c != '.')
        .map(|(index, _)| index)
        .unwrap_or(rest.len());
    let value: f64 = rest[..end].parse().ok()?;

    let tail = rest[end..].trim_start();
    let value = match tail.strip_prefix('/') {
        Some(denominator) => {
            let digits: String = denominator
                .trim_start()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if digits == "10" { value * 10.0 } else { value }
        }
        None => value,
    };

    (0.0..=100.0).contains(&value).then_some(value)
}
