use std::sync::Arc;

use crate::config::Config;
use crate::db::{create_redis_client, RedisStore, SequencerStore, StoreWriterHandle};
use crate::error::EngineResult;
use crate::models::BaselineList;
use crate::services::{ComparisonSequencer, DiscoverRecommender, MovieSearcher, TmdbCatalog, WildcardSession};

/// The engine's collaborators, wired from one [`Config`]: a Redis-backed
/// store, the cached TMDB catalog, and the curated baseline list.
pub struct Engine {
    config: Config,
    catalog: Arc<TmdbCatalog>,
    store: SequencerStore,
    baseline: Arc<BaselineList>,
    writer: StoreWriterHandle,
}

impl Engine {
    /// Loads `WUVO_` variables (and `.env`) and wires the engine
    pub async fn from_env() -> anyhow::Result<Self> {
        let config = Config::from_env()?;
        Self::from_config(config).await
    }

    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        config.validate()?;

        let redis_client = create_redis_client(&config.redis_url)?;
        let (redis, writer) = RedisStore::new(redis_client).await;

        let catalog = Arc::new(TmdbCatalog::cached_from_config(&config, redis.clone()));
        let store = SequencerStore::from_config(Arc::new(redis), &config);

        tracing::info!(
            namespace = %config.store_namespace,
            cache_ttl = config.catalog_cache_ttl,
            min_score = config.min_recommendation_score,
            min_vote_count = config.min_vote_count,
            "Engine configured"
        );

        Ok(Self {
            config,
            catalog,
            store,
            baseline: Arc::new(BaselineList::curated()),
            writer,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn searcher(&self) -> EngineResult<MovieSearcher> {
        MovieSearcher::from_config(self.catalog.clone(), &self.config)
    }

    pub fn sequencer(&self) -> ComparisonSequencer {
        let recommender = Arc::new(DiscoverRecommender::new(self.catalog.clone()));
        ComparisonSequencer::from_config(
            self.baseline.clone(),
            self.catalog.clone(),
            recommender,
            &self.config,
        )
    }

    /// Opens the user's session from the persisted library and progress
    pub async fn open_session(&self) -> EngineResult<WildcardSession> {
        WildcardSession::open(self.sequencer(), self.store.clone()).await
    }

    /// Flushes queued writes and stops the store writer
    pub async fn shutdown(self) {
        self.writer.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[tokio::test]
    async fn test_wires_from_config_without_connecting() {
        let config = test_config(&[
            ("WUVO_REDIS_URL", "redis://127.0.0.1:9"),
            ("WUVO_STORE_NAMESPACE", "tenant"),
        ]);

        let engine = Engine::from_config(config).await.unwrap();

        assert_eq!(engine.config().store_namespace, "tenant");
        assert!(engine.searcher().is_ok());
        assert_eq!(engine.sequencer().baseline().len(), BaselineList::curated().len());
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_invalid_weights_rejected() {
        let config = test_config(&[("WUVO_TITLE_SIMILARITY_WEIGHT", "0.9")]);
        assert!(Engine::from_config(config).await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_redis_url_rejected() {
        let config = test_config(&[("WUVO_REDIS_URL", "not a url")]);
        assert!(Engine::from_config(config).await.is_err());
    }
}
