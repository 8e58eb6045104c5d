use chrono::{Datelike, Utc};

use super::preference::PreferenceProfile;
use super::similarity::similarity;
use crate::config::Config;
use crate::error::{EngineError, EngineResult};
use crate::models::{CatalogMovie, RatedMovie, WatchlistMovie};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Relative weight of each relevance signal. Always non-negative and
/// summing to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingWeights {
    title_similarity: f64,
    user_preference: f64,
    popularity: f64,
}

impl RankingWeights {
    pub fn new(title_similarity: f64, user_preference: f64, popularity: f64) -> EngineResult<Self> {
        let weights = [title_similarity, user_preference, popularity];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "ranking weights must be non-negative, got {:?}",
                weights
            )));
        }

        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(EngineError::InvalidConfig(format!(
                "ranking weights must sum to 1.0, got {}",
                sum
            )));
        }

        Ok(Self {
            title_similarity,
            user_preference,
            popularity,
        })
    }

    pub fn title_similarity(&self) -> f64 {
        self.title_similarity
    }

    pub fn user_preference(&self) -> f64 {
        self.user_preference
    }

    pub fn popularity(&self) -> f64 {
        self.popularity
    }
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            title_similarity: 0.4,
            user_preference: 0.3,
            popularity: 0.3,
        }
    }
}

/// A catalog movie with its relevance breakdown
#[derive(Debug, Clone, PartialEq)]
pub struct RankedMovie {
    pub movie: CatalogMovie,
    pub title_similarity: f64,
    pub user_preference_score: f64,
    pub popularity_score: f64,
    pub final_score: f64,
}

/// Orders already-fetched candidates by relevance to a query and to the
/// user's rated history. Performs no I/O.
#[derive(Debug, Clone)]
pub struct RelevanceRanker {
    weights: RankingWeights,
    similarity_threshold: f64,
}

/// Queries this short skip the similarity filter and lean on popularity
pub const GENERIC_QUERY_MAX_LEN: usize = 3;

const GENERIC_POPULARITY_WEIGHT: f64 = 0.8;
const GENERIC_SIMILARITY_WEIGHT: f64 = 0.2;

impl Default for RelevanceRanker {
    fn default() -> Self {
        Self::new(RankingWeights::default(), 0.3)
    }
}

impl RelevanceRanker {
    pub fn new(weights: RankingWeights, similarity_threshold: f64) -> Self {
        Self {
            weights,
            similarity_threshold,
        }
    }

    /// Weights and similarity threshold from configuration
    pub fn from_config(config: &Config) -> EngineResult<Self> {
        Ok(Self::new(config.ranking_weights()?, config.similarity_threshold))
    }

    pub fn weights(&self) -> RankingWeights {
        self.weights
    }

    /// Scores and sorts candidates, best first. Candidates whose title is
    /// too far from a non-generic query are dropped.
    pub fn rank(
        &self,
        candidates: Vec<CatalogMovie>,
        query: &str,
        history: &[RatedMovie],
    ) -> Vec<RankedMovie> {
        let generic = is_generic_query(query);
        let profile = PreferenceProfile::derive(history);
        let has_history = !history.is_empty();

        let mut ranked: Vec<RankedMovie> = candidates
            .into_iter()
            .filter_map(|movie| {
                let title_similarity = similarity(&movie.title, query);
                if !generic && title_similarity < self.similarity_threshold {
                    return None;
                }

                let user_preference_score = if has_history {
                    user_preference_score(&movie, &profile)
                } else {
                    0.5
                };
                let popularity_score = popularity_score(&movie);

                let final_score = if generic {
                    popularity_score * GENERIC_POPULARITY_WEIGHT
                        + title_similarity * GENERIC_SIMILARITY_WEIGHT
                } else {
                    title_similarity * self.weights.title_similarity
                        + user_preference_score * self.weights.user_preference
                        + popularity_score * self.weights.popularity
                };

                Some(RankedMovie {
                    movie,
                    title_similarity,
                    user_preference_score,
                    popularity_score,
                    final_score,
                })
            })
            .collect();

        ranked.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));
        ranked
    }
}

/// Length is taken as given; callers trim user input beforehand
pub fn is_generic_query(query: &str) -> bool {
    query.chars().count() <= GENERIC_QUERY_MAX_LEN
}

/// Fit between a candidate and the user's taste, in [0, 1]
pub fn user_preference_score(movie: &CatalogMovie, profile: &PreferenceProfile) -> f64 {
    let genre_boost = (profile.centered_affinity_for(&movie.genre_ids) / 10.0).clamp(0.0, 0.3);

    let era_term = match (movie.release_year(), profile.preferred_era_year) {
        (Some(year), Some(era)) => {
            let distance = (f64::from(year) - era).abs().min(30.0);
            0.1 - distance / 300.0
        }
        _ => 0.0,
    };

    // Director and cast affinity would add a third term here
    (0.5 + genre_boost + era_term).clamp(0.0, 1.0)
}

/// Vote volume and vote quality blended into [0, 1]
pub fn popularity_score(movie: &CatalogMovie) -> f64 {
    let vote_count = if movie.vote_count > 0 {
        ((movie.vote_count as f64).log10() / 4.0).min(1.0)
    } else {
        0.0
    };

    let vote_average = if movie.vote_average > 0.0 {
        movie.vote_average
    } else {
        5.0
    };
    let vote_average = ((vote_average - 1.0) / 9.0).clamp(0.0, 1.0);

    0.7 * vote_count + 0.3 * vote_average
}

/// Watchlist entry ordered by fit with the rated history
#[derive(Debug, Clone, PartialEq)]
pub struct WatchlistSuggestion {
    pub movie: WatchlistMovie,
    pub score: f64,
}

const SUGGESTION_LIMIT: usize = 20;

/// Watchlist entries the user is most likely to enjoy next
pub fn suggest_from_watchlist<'a>(
    history: &[RatedMovie],
    watchlist: impl IntoIterator<Item = &'a WatchlistMovie>,
) -> Vec<WatchlistSuggestion> {
    suggest_with_reference_year(history, watchlist, Utc::now().year())
}

fn suggest_with_reference_year<'a>(
    history: &[RatedMovie],
    watchlist: impl IntoIterator<Item = &'a WatchlistMovie>,
    current_year: i32,
) -> Vec<WatchlistSuggestion> {
    let profile = PreferenceProfile::derive(history);

    let (weighted, total) = history
        .iter()
        .filter_map(|m| m.release_year().map(|y| (f64::from(y), m.user_rating)))
        .fold((0.0, 0.0), |(sum, weight), (year, rating)| {
            (sum + year * rating, weight + rating)
        });
    let reference_year = if total > 0.0 {
        weighted / total
    } else {
        f64::from(current_year - 10)
    };

    let mut suggestions: Vec<WatchlistSuggestion> = watchlist
        .into_iter()
        .filter(|m| m.poster_path.is_some())
        .map(|movie| {
            let genre_score = profile.raw_affinity(&movie.genre_ids);
            let year_score = movie
                .release_year()
                .map(|y| (1.0 - (f64::from(y) - reference_year).abs() / 50.0).max(0.0))
                .unwrap_or(0.0);

            WatchlistSuggestion {
                movie: movie.clone(),
                score: genre_score * 0.7 + year_score * 0.3,
            }
        })
        .collect();

    suggestions.sort_by(|a, b| b.score.total_cmp(&a.score));
    suggestions.truncate(SUGGESTION_LIMIT);
    suggestions
}
