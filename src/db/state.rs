use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{PersistentStore, StoreKey};
use crate::config::Config;
use crate::error::EngineResult;
use crate::models::sequencer_state::PATTERN_LENGTH;
use crate::models::{MovieId, MovieLibrary, RatedMovie, SequencerState, WatchlistMovie};

/// Loads and saves [`SequencerState`] and the user's [`MovieLibrary`] under
/// namespaced keys
#[derive(Clone)]
pub struct SequencerStore {
    store: Arc<dyn PersistentStore>,
    namespace: String,
}

impl SequencerStore {
    pub fn new(store: Arc<dyn PersistentStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    pub fn from_config(store: Arc<dyn PersistentStore>, config: &Config) -> Self {
        Self::new(store, config.store_namespace.clone())
    }

    fn key(&self, key: &StoreKey) -> String {
        key.with_namespace(&self.namespace)
    }

    /// Reads the saved state. Missing or unreadable values fall back to
    /// their defaults; store failures are returned.
    pub async fn load(&self) -> EngineResult<SequencerState> {
        let compared_ids = self.load_ids(&StoreKey::ComparedIds).await?;
        let skipped_ids = self.load_ids(&StoreKey::SkippedIds).await?;
        let baseline_complete = self
            .store
            .get(&self.key(&StoreKey::BaselineComplete))
            .await?
            .map_or(false, |v| v.trim() == "true");
        let total_comparisons: u32 = self.load_number(&StoreKey::ComparisonCount).await?;
        let pattern_position: u8 = self.load_number(&StoreKey::ComparisonPattern).await?;

        let pattern_position = if pattern_position < PATTERN_LENGTH {
            pattern_position
        } else {
            tracing::warn!(pattern_position, "Stored pattern position out of range, resetting");
            0
        };

        let state = SequencerState {
            compared_ids,
            skipped_ids,
            total_comparisons,
            pattern_position,
            baseline_complete,
        };

        tracing::info!(
            compared = state.compared_ids.len(),
            skipped = state.skipped_ids.len(),
            baseline_complete = state.baseline_complete,
            total_comparisons = state.total_comparisons,
            pattern_position = state.pattern_position,
            "Loaded sequencer state"
        );

        Ok(state)
    }

    async fn load_ids(&self, key: &StoreKey) -> EngineResult<BTreeSet<MovieId>> {
        let Some(raw) = self.store.get(&self.key(key)).await? else {
            return Ok(BTreeSet::new());
        };

        match serde_json::from_str::<Vec<MovieId>>(&raw) {
            Ok(ids) => Ok(ids.into_iter().collect()),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding unreadable id list");
                Ok(BTreeSet::new())
            }
        }
    }

    async fn load_number<T: FromStr + Default>(&self, key: &StoreKey) -> EngineResult<T> {
        let Some(raw) = self.store.get(&self.key(key)).await? else {
            return Ok(T::default());
        };

        Ok(raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key = %key, value = %raw, "Discarding unreadable counter");
            T::default()
        }))
    }

    /// Queues a write of every field
    pub fn persist(&self, state: &SequencerState) {
        let compared: Vec<MovieId> = state.compared_ids.iter().copied().collect();
        let skipped: Vec<MovieId> = state.skipped_ids.iter().copied().collect();

        self.write_json(&StoreKey::ComparedIds, &compared);
        self.write_json(&StoreKey::SkippedIds, &skipped);

        self.store.set(
            &self.key(&StoreKey::BaselineComplete),
            state.baseline_complete.to_string(),
        );
        self.store.set(
            &self.key(&StoreKey::ComparisonCount),
            state.total_comparisons.to_string(),
        );
        self.store.set(
            &self.key(&StoreKey::ComparisonPattern),
            state.pattern_position.to_string(),
        );
    }

    /// Reads the rated list and watchlist. Unreadable lists are treated as
    /// empty.
    pub async fn load_library(&self) -> EngineResult<MovieLibrary> {
        let rated: Vec<RatedMovie> = self.load_list(&StoreKey::RatedMovies).await?;
        let watchlist: Vec<WatchlistMovie> = self.load_list(&StoreKey::Watchlist).await?;

        tracing::info!(
            rated = rated.len(),
            watchlist = watchlist.len(),
            "Loaded movie library"
        );

        Ok(MovieLibrary::from_parts(rated, watchlist))
    }

    async fn load_list<T: DeserializeOwned>(&self, key: &StoreKey) -> EngineResult<Vec<T>> {
        let Some(raw) = self.store.get(&self.key(key)).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(list) => Ok(list),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding unreadable movie list");
                Ok(Vec::new())
            }
        }
    }

    /// Queues a write of both library lists
    pub fn persist_library(&self, library: &MovieLibrary) {
        let rated: Vec<&RatedMovie> = library.rated().collect();
        let watchlist: Vec<&WatchlistMovie> = library.watchlist().collect();
        self.write_json(&StoreKey::RatedMovies, &rated);
        self.write_json(&StoreKey::Watchlist, &watchlist);
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &StoreKey, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.store.set(&self.key(key), json),
            Err(e) => tracing::error!(key = %key, error = %e, "Failed to serialize value"),
        }
    }

    /// Removes all sequencer keys in one call. The library is kept.
    pub fn clear(&self) {
        let keys: Vec<String> = StoreKey::SEQUENCER_KEYS
            .iter()
            .map(|key| self.key(key))
            .collect();
        self.store.multi_remove(&keys);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::MockPersistentStore;
    use crate::db::MemoryStore;
    use crate::error::EngineError;
    use crate::models::CatalogMovie;

    #[tokio::test]
    async fn test_load_empty_store_gives_defaults() {
        let store = SequencerStore::new(Arc::new(MemoryStore::new()), "wuvo");
        let state = store.load().await.unwrap();
        assert_eq!(state, SequencerState::default());
    }

    #[tokio::test]
    async fn test_persist_then_load() {
        let memory = Arc::new(MemoryStore::new());
        let store = SequencerStore::new(memory.clone(), "wuvo");

        let mut state = SequencerState::new();
        state.compared_ids.extend([238, 155]);
        state.skipped_ids.insert(550);
        state.total_comparisons = 7;
        state.pattern_position = 2;
        state.baseline_complete = true;

        store.persist(&state);

        assert_eq!(
            memory.snapshot("wuvo_compared_movies"),
            Some("[155,238]".to_string())
        );
        assert_eq!(memory.snapshot("wuvo_baseline_complete"), Some("true".to_string()));
        assert_eq!(store.load().await.unwrap(), state);
    }

    #[tokio::test]
    async fn test_corrupt_values_fall_back() {
        let memory = Arc::new(MemoryStore::new());
        memory.set("wuvo_compared_movies", "not json".to_string());
        memory.set("wuvo_comparison_count", "lots".to_string());
        memory.set("wuvo_comparison_pattern", "9".to_string());
        memory.set("wuvo_skipped_movies", "[12]".to_string());

        let state = SequencerStore::new(memory, "wuvo").load().await.unwrap();

        assert!(state.compared_ids.is_empty());
        assert_eq!(state.total_comparisons, 0);
        assert_eq!(state.pattern_position, 0);
        assert!(state.skipped_ids.contains(&12));
    }

    fn catalog_movie(id: MovieId) -> CatalogMovie {
        CatalogMovie {
            id,
            title: format!("Movie {}", id),
            poster_path: Some(format!("/{}.jpg", id)),
            vote_average: 7.4,
            vote_count: 900,
            release_date: Some("2001-09-14".to_string()),
            genre_ids: vec![18],
            overview: None,
        }
    }

    #[tokio::test]
    async fn test_library_persist_then_load() {
        let memory = Arc::new(MemoryStore::new());
        let store = SequencerStore::new(memory.clone(), "wuvo");

        let mut library = MovieLibrary::new();
        library.rate(&catalog_movie(238), 9.2).unwrap();
        library.add_to_watchlist(catalog_movie(680).into());
        store.persist_library(&library);

        assert!(memory.snapshot("wuvo_user_seen_movies").is_some());
        assert!(memory.snapshot("wuvo_user_unseen_movies").is_some());
        assert_eq!(store.load_library().await.unwrap(), library);

        // Clearing comparison progress keeps the library
        store.persist(&SequencerState::new());
        store.clear();
        assert!(memory.snapshot("wuvo_comparison_count").is_none());
        assert_eq!(store.load_library().await.unwrap(), library);
    }

    #[tokio::test]
    async fn test_unreadable_library_is_empty() {
        let memory = Arc::new(MemoryStore::new());
        memory.set("wuvo_user_seen_movies", "{broken".to_string());

        let library = SequencerStore::new(memory, "wuvo").load_library().await.unwrap();
        assert_eq!(library, MovieLibrary::new());
    }

    #[tokio::test]
    async fn test_clear_removes_all_keys_at_once() {
        let mut mock = MockPersistentStore::new();
        mock.expect_multi_remove()
            .withf(|keys| keys.len() == 5 && keys.iter().all(|k| k.starts_with("custom_")))
            .times(1)
            .return_const(());

        SequencerStore::new(Arc::new(mock), "custom").clear();
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let mut mock = MockPersistentStore::new();
        mock.expect_get().returning(|_| {
            Err(EngineError::Store(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "connection refused",
            ))))
        });

        let result = SequencerStore::new(Arc::new(mock), "wuvo").load().await;
        assert!(matches!(result, Err(EngineError::Store(_))));
    }
}
