use crate::config::GithubConfig;
use crate::event::RepoRef;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

/// Page size for list endpoints (GitHub's maximum)
const PER_PAGE: usize = 100;
/// REST API version pinned in every request
const API_VERSION: &str = "2022-11-28";

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    #[error("Invalid response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid GitHub client setup: {0}")]
    Setup(String),
}

/// How a commit changed a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Removed,
    Modified,
    Renamed,
    Copied,
    Changed,
    Unchanged,
    #[serde(other)]
    Other,
}

/// One file entry of a commit, as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitFile {
    pub filename: String,
    pub status: FileStatus,
    /// Absent for binary files and diffs too large to inline
    #[serde(default)]
    pub patch: Option<String>,
}

/// Hosting platform operations the review needs
pub trait HostingPlatform {
    /// Every commit of a pull request, oldest first
    async fn list_pull_request_commits(
        &self,
        repo: &RepoRef,
        number: u64,
    ) -> Result<Vec<String>, PlatformError>;

    /// The files a single commit touched, with their patches
    async fn commit_files(&self, repo: &RepoRef, sha: &str) -> Result<Vec<CommitFile>, PlatformError>;
}

#[derive(Debug, Deserialize)]
struct CommitSummary {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    #[serde(default)]
    files: Vec<CommitFile>,
}

/// GitHub REST API client
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
}

impl GitHubClient {
    pub fn new(config: &GithubConfig, token: &str) -> Result<Self, PlatformError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| PlatformError::Setup(format!("token is not a valid header value: {}", e)))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| PlatformError::Setup(format!("invalid user agent: {}", e)))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PlatformError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, PlatformError> {
        trace!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| PlatformError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| PlatformError::Request {
            url: url.to_string(),
            source,
        })?;
        if !status.is_success() {
            return Err(PlatformError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        decode(url, &body)
    }
}

fn decode<T: DeserializeOwned>(url: &str, body: &str) -> Result<T, PlatformError> {
    serde_json::from_str(body).map_err(|source| PlatformError::Decode {
        url: url.to_string(),
        source,
    })
}

fn pull_request_commits_url(api_url: &str, repo: &RepoRef, number: u64, page: usize) -> String {
    format!(
        "{}/repos/{}/{}/pulls/{}/commits?per_page={}&page={}",
        api_url, repo.owner, repo.name, number, PER_PAGE, page
    )
}

fn commit_url(api_url: &str, repo: &RepoRef, sha: &str, page: usize) -> String {
    format!(
        "{}/repos/{}/{}/commits/{}?per_page={}&page={}",
        api_url, repo.owner, repo.name, sha, PER_PAGE, page
    )
}

impl HostingPlatform for GitHubClient {
    async fn list_pull_request_commits(
        &self,
        repo: &RepoRef,
        number: u64,
    ) -> Result<Vec<String>, PlatformError> {
        let mut commits = Vec::new();
        for page in 1.. {
            let url = pull_request_commits_url(&self.api_url, repo, number, page);
            let batch: Vec<CommitSummary> = self.get_json(&url).await?;
            let done = batch.len() < PER_PAGE;
            commits.extend(batch.into_iter().map(|c| c.sha));
            if done {
                break;
            }
        }
        debug!("Pull request {}#{} has {} commits", repo, number, commits.len());
        Ok(commits)
    }

    async fn commit_files(&self, repo: &RepoRef, sha: &str) -> Result<Vec<CommitFile>, PlatformError> {
        let mut files = Vec::new();
        for page in 1.. {
            let url = commit_url(&self.api_url, repo, sha, page);
            let detail: CommitDetail = self.get_json(&url).await?;
            let done = detail.files.len() < PER_PAGE;
            files.extend(detail.files);
            if done {
                break;
            }
        }
        debug!("Commit {} touched {} files", sha, files.len());
        Ok(files)
    }
}
