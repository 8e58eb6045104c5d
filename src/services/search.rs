use std::collections::HashSet;
use std::sync::Arc;

use super::providers::MovieCatalog;
use super::ranking::{RankedMovie, RelevanceRanker};
use crate::config::Config;
use crate::error::EngineResult;
use crate::models::{MovieId, RatedMovie};

/// Queries shorter than this return nothing
const MIN_QUERY_CHARS: usize = 2;
/// Below this many primary results a backup search runs
const BACKUP_SEARCH_THRESHOLD: usize = 3;
/// First words this short are not worth a backup search
const MIN_BACKUP_WORD_CHARS: usize = 3;

/// Title search over the catalog, ranked for the current user
pub struct MovieSearcher {
    catalog: Arc<dyn MovieCatalog>,
    ranker: RelevanceRanker,
    max_results: usize,
}

impl MovieSearcher {
    pub fn new(catalog: Arc<dyn MovieCatalog>, ranker: RelevanceRanker, max_results: usize) -> Self {
        Self {
            catalog,
            ranker,
            max_results,
        }
    }

    /// Ranker settings and result limit from configuration
    pub fn from_config(catalog: Arc<dyn MovieCatalog>, config: &Config) -> EngineResult<Self> {
        Ok(Self::new(
            catalog,
            RelevanceRanker::from_config(config)?,
            config.max_search_results,
        ))
    }

    pub async fn search(&self, query: &str, history: &[RatedMovie]) -> EngineResult<Vec<RankedMovie>> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            return Ok(Vec::new());
        }

        let mut results = self.catalog.search_by_title(query).await?;

        if results.len() < BACKUP_SEARCH_THRESHOLD && query.contains(' ') {
            if let Some(first_word) = query
                .split_whitespace()
                .next()
                .filter(|word| word.chars().count() >= MIN_BACKUP_WORD_CHARS)
            {
                match self.catalog.search_by_title(first_word).await {
                    Ok(backup) => {
                        let mut seen: HashSet<MovieId> = results.iter().map(|m| m.id).collect();
                        let before = results.len();
                        results.extend(backup.into_iter().filter(|m| seen.insert(m.id)));
                        tracing::debug!(
                            query = %query,
                            backup_query = %first_word,
                            added = results.len() - before,
                            "Merged backup search results"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(
                            query = %query,
                            backup_query = %first_word,
                            provider = self.catalog.name(),
                            error = %e,
                            "Backup search failed"
                        );
                    }
                }
            }
        }

        let mut ranked = self.ranker.rank(results, query, history);
        ranked.truncate(self.max_results);
        Ok(ranked)
    }
}
