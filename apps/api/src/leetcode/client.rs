//! LeetCode GraphQL client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

const USER_AGENT: &str = "placement-api";

const PROFILE_QUERY: &str = r#"
query userProfile($username: String!) {
  matchedUser(username: $username) {
    username
    submitStatsGlobal {
      acSubmissionNum { difficulty count }
    }
    userCalendar {
      submissionCalendar
    }
  }
}
"#;

#[derive(Debug, Clone, Deserialize)]
pub struct DifficultyCount {
    pub difficulty: String,
    pub count: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitStats {
    #[serde(default)]
    pub ac_submission_num: Vec<DifficultyCount>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCalendar {
    /// JSON object encoded as a string: unix seconds → submissions that day.
    #[serde(default)]
    pub submission_calendar: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedUser {
    pub username: String,
    #[serde(default)]
    pub submit_stats_global: Option<SubmitStats>,
    #[serde(default)]
    pub user_calendar: Option<UserCalendar>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileData {
    matched_user: Option<MatchedUser>,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

/// Solved counts as stored in `students.leetcode_stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeetcodeStats {
    pub username: String,
    pub total_solved: u32,
    pub easy_solved: u32,
    pub medium_solved: u32,
    pub hard_solved: u32,
}

impl LeetcodeStats {
    pub fn from_user(user: &MatchedUser) -> Self {
        let mut stats = Self {
            username: user.username.clone(),
            ..Self::default()
        };
        let counts = user
            .submit_stats_global
            .as_ref()
            .map(|s| s.ac_submission_num.as_slice())
            .unwrap_or(&[]);
        for entry in counts {
            match entry.difficulty.as_str() {
                "All" => stats.total_solved = entry.count,
                "Easy" => stats.easy_solved = entry.count,
                "Medium" => stats.medium_solved = entry.count,
                "Hard" => stats.hard_solved = entry.count,
                _ => {}
            }
        }
        if stats.total_solved == 0 {
            stats.total_solved = stats
                .easy_solved
                .saturating_add(stats.medium_solved)
                .saturating_add(stats.hard_solved);
        }
        stats
    }
}

#[async_trait]
pub trait LeetcodeApi: Send + Sync {
    /// `Ok(None)` when the username does not exist.
    async fn profile(&self, username: &str) -> anyhow::Result<Option<MatchedUser>>;
}

#[derive(Clone)]
pub struct LeetcodeClient {
    client: Client,
    graphql_url: String,
}

impl LeetcodeClient {
    pub fn new(graphql_url: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(15))
                .user_agent(USER_AGENT)
                .build()?,
            graphql_url: graphql_url.into(),
        })
    }
}

#[async_trait]
impl LeetcodeApi for LeetcodeClient {
    async fn profile(&self, username: &str) -> anyhow::Result<Option<MatchedUser>> {
        debug!("LeetCode profile query for {username}");
        let response = self
            .client
            .post(&self.graphql_url)
            .header("Referer", "https://leetcode.com")
            .json(&json!({
                "query": PROFILE_QUERY,
                "variables": { "username": username },
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("LeetCode API error (status {status}): {body}");
        }

        let body: GraphqlResponse<ProfileData> = response.json().await?;
        // Unknown users come back as a GraphQL error with a null matchedUser.
        if let Some(err) = body.errors.first() {
            debug!("LeetCode query error for {username}: {}", err.message);
        }
        Ok(body.data.and_then(|d| d.matched_user))
    }
}
