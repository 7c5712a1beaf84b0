//! GitHub REST client. The only module that talks to api.github.com.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const USER_AGENT: &str = "placement-api";
const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";
pub const REPOS_PER_PAGE: usize = 100;

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("GitHub rate limit exceeded")]
    RateLimited,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubUser {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub public_repos: u32,
    #[serde(default)]
    pub followers: u32,
    #[serde(default)]
    pub following: u32,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoOwner {
    pub login: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubRepo {
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    pub owner: RepoOwner,
    pub html_url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub stargazers_count: u32,
    #[serde(default)]
    pub forks_count: u32,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
}

/// Language name → bytes of code, as returned by `/repos/{owner}/{repo}/languages`.
pub type LanguageBytes = HashMap<String, u64>;

/// Seam for the sync job; tests substitute an in-memory implementation.
#[async_trait]
pub trait GithubApi: Send + Sync {
    async fn user(&self, token: &str) -> Result<GithubUser, GithubError>;
    async fn repos_page(&self, token: &str, page: u32) -> Result<Vec<GithubRepo>, GithubError>;
    async fn languages(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
    ) -> Result<LanguageBytes, GithubError>;
}

#[derive(Clone)]
pub struct GithubClient {
    client: Client,
    base_url: String,
}

impl GithubClient {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(20))
                .user_agent(USER_AGENT)
                .build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
    ) -> Result<T, GithubError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GitHub GET {url}");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header("Accept", GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .send()
            .await?;

        let status = response.status();
        let remaining = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if status == StatusCode::TOO_MANY_REQUESTS
            || (status == StatusCode::FORBIDDEN && remaining.as_deref() == Some("0"))
        {
            return Err(GithubError::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GithubError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl GithubApi for GithubClient {
    async fn user(&self, token: &str) -> Result<GithubUser, GithubError> {
        self.get_json(token, "/user").await
    }

    async fn repos_page(&self, token: &str, page: u32) -> Result<Vec<GithubRepo>, GithubError> {
        let path = format!("/user/repos?per_page={REPOS_PER_PAGE}&page={page}&sort=updated");
        self.get_json(token, &path).await
    }

    async fn languages(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
    ) -> Result<LanguageBytes, GithubError> {
        self.get_json(token, &format!("/repos/{owner}/{repo}/languages"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_deserializes_with_missing_optional_fields() {
        let json = r#"{
            "name": "dotfiles",
            "owner": {"login": "asha"},
            "html_url": "https://github.com/asha/dotfiles"
        }"#;
        let repo: GithubRepo = serde_json::from_str(json).unwrap();
        assert_eq!(repo.name, "dotfiles");
        assert!(!repo.fork);
        assert!(!repo.private);
        assert!(repo.topics.is_empty());
        assert!(repo.pushed_at.is_none());
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = GithubClient::new("https://api.github.com/").unwrap();
        assert_eq!(client.base_url, "https://api.github.com");
    }
}
