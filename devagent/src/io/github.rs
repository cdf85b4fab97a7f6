//! Repository-hosting collaborator (GitHub REST API).

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::core::repo_id::RepoId;

/// Pull request fields sent to the hosting API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestDraft {
    pub title: String,
    pub head: String,
    pub base: String,
    pub body: String,
}

/// Issue fields sent to the hosting API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueRequest {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

/// Status and decoded JSON body of a hosting API call.
///
/// Any HTTP status is returned; callers decide what a non-2xx means.
#[derive(Debug, Clone, PartialEq)]
pub struct HostResponse {
    pub status: u16,
    pub body: Value,
}

impl HostResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn html_url(&self) -> Option<String> {
        self.body
            .get("html_url")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn number(&self) -> Option<u64> {
        self.body.get("number").and_then(Value::as_u64)
    }

    /// Human-readable failure description for non-2xx responses.
    pub fn failure_message(&self) -> String {
        let detail = self
            .body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| self.body.to_string());
        format!("hosting API returned HTTP {}: {}", self.status, detail)
    }
}

pub trait RepositoryHost {
    fn create_pull_request(&self, repo: &RepoId, draft: &PullRequestDraft)
    -> Result<HostResponse>;
    fn create_issue(&self, repo: &RepoId, issue: &IssueRequest) -> Result<HostResponse>;
}

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub api_url: String,
    pub token: String,
    pub timeout: Duration,
}

/// Blocking GitHub REST client authenticated with a bearer token.
pub struct GitHub {
    http: reqwest::blocking::Client,
    api_url: String,
}

impl GitHub {
    pub fn new(config: GitHubConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("devagent/", env!("CARGO_PKG_VERSION"))),
        );
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .context("GITHUB_TOKEN is not a valid header value")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .context("build github http client")?;
        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn post<T: Serialize>(&self, url: &str, payload: &T) -> Result<HostResponse> {
        let response = self
            .http
            .post(url)
            .json(payload)
            .send()
            .with_context(|| format!("POST {url}"))?;
        let status = response.status().as_u16();
        let text = response.text().context("read github response body")?;
        debug!(status, bytes = text.len(), "github response received");
        Ok(HostResponse {
            status,
            body: decode_body(&text),
        })
    }
}

impl RepositoryHost for GitHub {
    #[instrument(skip_all, fields(repo = %repo, head = %draft.head, base = %draft.base))]
    fn create_pull_request(
        &self,
        repo: &RepoId,
        draft: &PullRequestDraft,
    ) -> Result<HostResponse> {
        let url = format!("{}/repos/{}/pulls", self.api_url, repo);
        self.post(&url, draft)
    }

    #[instrument(skip_all, fields(repo = %repo, labels = issue.labels.len()))]
    fn create_issue(&self, repo: &RepoId, issue: &IssueRequest) -> Result<HostResponse> {
        let url = format!("{}/repos/{}/issues", self.api_url, repo);
        self.post(&url, issue)
    }
}

/// Decode a response body, keeping non-JSON text as a string value.
fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
