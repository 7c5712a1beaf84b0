use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use axum::extract::FromRef;
use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::auth::AuthKeys;
use crate::config::Config;
use crate::github::client::{GithubApi, GithubClient};
use crate::leetcode::client::{LeetcodeApi, LeetcodeClient};
use crate::llm_client::LlmClient;
use crate::market::demand::HttpDemandSource;
use crate::market::refresher::MarketRefresher;
use crate::market::store::PgMarketStore;
use crate::matching::scorer::{MatchScorer, WeightedMatchScorer};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis: RedisClient,
    pub s3: S3Client,
    pub llm: LlmClient,
    pub config: Config,
    pub auth: AuthKeys,
    /// Pluggable match scorer. Default: `WeightedMatchScorer`.
    pub matcher: Arc<dyn MatchScorer>,
    pub github: Arc<dyn GithubApi>,
    pub leetcode: Arc<dyn LeetcodeApi>,
    /// Process-wide: holds the run lock and the last refresh report.
    pub market: Arc<MarketRefresher>,
}

impl AppState {
    /// Wires the default clients around already-constructed connections.
    pub fn new(
        config: Config,
        db: PgPool,
        redis: RedisClient,
        s3: S3Client,
    ) -> anyhow::Result<Self> {
        let market_store = Arc::new(PgMarketStore::new(
            db.clone(),
            redis.clone(),
            config.market_cache_ttl_secs,
        ));
        let demand_source = Arc::new(HttpDemandSource::new(config.market_data_url.clone())?);

        Ok(Self {
            llm: LlmClient::new(config.anthropic_api_key.clone())?,
            auth: AuthKeys::new(config.jwt_secret.clone()),
            matcher: Arc::new(WeightedMatchScorer::default()),
            github: Arc::new(GithubClient::new(config.github_api_url.clone())?),
            leetcode: Arc::new(LeetcodeClient::new(config.leetcode_graphql_url.clone())?),
            market: Arc::new(MarketRefresher::new(market_store, demand_source)),
            db,
            redis,
            s3,
            config,
        })
    }
}

impl FromRef<AppState> for AuthKeys {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
