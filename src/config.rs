use serde::Deserialize;

use crate::error::{EngineError, EngineResult};
use crate::services::ranking::RankingWeights;

/// Engine configuration loaded from `WUVO_`-prefixed environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB API key
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Redis connection URL backing the persistent store
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Prefix for every persisted key
    #[serde(default = "default_store_namespace")]
    pub store_namespace: String,

    /// Minimum TMDB vote average for recommended candidates
    #[serde(default = "default_min_recommendation_score")]
    pub min_recommendation_score: f64,

    /// Minimum TMDB vote count for recommended candidates
    #[serde(default = "default_min_vote_count")]
    pub min_vote_count: u64,

    #[serde(default = "default_max_search_results")]
    pub max_search_results: usize,

    /// Title similarity below which search results are dropped
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    #[serde(default = "default_title_similarity_weight")]
    pub title_similarity_weight: f64,

    #[serde(default = "default_user_preference_weight")]
    pub user_preference_weight: f64,

    #[serde(default = "default_popularity_weight")]
    pub popularity_weight: f64,

    /// TTL in seconds for cached catalog responses
    #[serde(default = "default_catalog_cache_ttl")]
    pub catalog_cache_ttl: u64,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_store_namespace() -> String {
    "wuvo".to_string()
}

fn default_min_recommendation_score() -> f64 {
    7.0
}

fn default_min_vote_count() -> u64 {
    500
}

fn default_max_search_results() -> usize {
    10
}

fn default_similarity_threshold() -> f64 {
    0.3
}

fn default_title_similarity_weight() -> f64 {
    0.4
}

fn default_user_preference_weight() -> f64 {
    0.3
}

fn default_popularity_weight() -> f64 {
    0.3
}

fn default_catalog_cache_ttl() -> u64 {
    3600
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::prefixed("WUVO_")
            .from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Relevance weights, validated to be non-negative and sum to 1.0
    pub fn ranking_weights(&self) -> EngineResult<RankingWeights> {
        RankingWeights::new(
            self.title_similarity_weight,
            self.user_preference_weight,
            self.popularity_weight,
        )
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.tmdb_api_key.trim().is_empty() {
            return Err(EngineError::InvalidConfig(
                "tmdb_api_key cannot be empty".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(EngineError::InvalidConfig(format!(
                "similarity_threshold must be within [0, 1], got {}",
                self.similarity_threshold
            )));
        }
        self.ranking_weights().map(|_| ())
    }
}

/// Configuration with a test API key plus the given overrides
#[cfg(test)]
pub(crate) fn test_config(vars: &[(&str, &str)]) -> Config {
    let vars = std::iter::once(("WUVO_TMDB_API_KEY", "secret"))
        .chain(vars.iter().copied())
        .map(|(k, v)| (k.to_string(), v.to_string()));
    envy::prefixed("WUVO_")
        .from_iter(vars)
        .expect("test configuration should deserialize")
}
