use std::fmt::Display;

use crate::error::EngineResult;
use crate::models::MovieId;

/// Keys written by the engine. Persisted keys are always prefixed with the
/// configured namespace, see [`StoreKey::with_namespace`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreKey {
    ComparedIds,
    SkippedIds,
    BaselineComplete,
    ComparisonCount,
    ComparisonPattern,
    RatedMovies,
    Watchlist,
    MovieDetails(MovieId),
    TitleSearch(String),
}

impl StoreKey {
    /// Keys that make up the persisted sequencer state
    pub const SEQUENCER_KEYS: [StoreKey; 5] = [
        StoreKey::ComparedIds,
        StoreKey::SkippedIds,
        StoreKey::BaselineComplete,
        StoreKey::ComparisonCount,
        StoreKey::ComparisonPattern,
    ];

    pub fn with_namespace(&self, namespace: &str) -> String {
        format!("{}_{}", namespace, self)
    }
}

impl Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKey::ComparedIds => write!(f, "compared_movies"),
            StoreKey::SkippedIds => write!(f, "skipped_movies"),
            StoreKey::BaselineComplete => write!(f, "baseline_complete"),
            StoreKey::ComparisonCount => write!(f, "comparison_count"),
            StoreKey::ComparisonPattern => write!(f, "comparison_pattern"),
            StoreKey::RatedMovies => write!(f, "user_seen_movies"),
            StoreKey::Watchlist => write!(f, "user_unseen_movies"),
            StoreKey::MovieDetails(id) => write!(f, "movie:{}", id),
            StoreKey::TitleSearch(query) => write!(f, "search:{}", query.to_lowercase()),
        }
    }
}

/// Key-value storage for engine state.
///
/// Reads are awaited; writes are fire-and-forget so that persistence never
/// holds up the in-memory state, which stays authoritative for the session.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PersistentStore: Send + Sync {
    async fn get(&self, key: &str) -> EngineResult<Option<String>>;

    fn set(&self, key: &str, value: String);

    fn remove(&self, key: &str);

    fn multi_remove(&self, keys: &[String]);
}
