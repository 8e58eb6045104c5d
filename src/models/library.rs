use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::movie::validate_rating;
use super::{round_to_tenth, CatalogMovie, GenreId, MovieId, RatedMovie, WatchlistMovie};
use crate::error::EngineResult;

/// The user's rated movies and watchlist, each keyed by catalog id.
///
/// A movie is never on both lists: rating a movie promotes it off the
/// watchlist, and rated movies cannot be added to the watchlist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieLibrary {
    rated: BTreeMap<MovieId, RatedMovie>,
    watchlist: BTreeMap<MovieId, WatchlistMovie>,
}

impl MovieLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a library from stored lists. Watchlist entries for movies that
    /// are already rated are dropped.
    pub fn from_parts(
        rated: impl IntoIterator<Item = RatedMovie>,
        watchlist: impl IntoIterator<Item = WatchlistMovie>,
    ) -> Self {
        let rated: BTreeMap<_, _> = rated.into_iter().map(|m| (m.id, m)).collect();
        let watchlist = watchlist
            .into_iter()
            .filter(|m| !rated.contains_key(&m.id))
            .map(|m| (m.id, m))
            .collect();
        Self { rated, watchlist }
    }

    pub fn rated_len(&self) -> usize {
        self.rated.len()
    }

    pub fn watchlist_len(&self) -> usize {
        self.watchlist.len()
    }

    pub fn is_rated(&self, id: MovieId) -> bool {
        self.rated.contains_key(&id)
    }

    pub fn on_watchlist(&self, id: MovieId) -> bool {
        self.watchlist.contains_key(&id)
    }

    pub fn get(&self, id: MovieId) -> Option<&RatedMovie> {
        self.rated.get(&id)
    }

    pub fn watchlist_entry(&self, id: MovieId) -> Option<&WatchlistMovie> {
        self.watchlist.get(&id)
    }

    /// Rated movies in id order
    pub fn rated(&self) -> impl Iterator<Item = &RatedMovie> {
        self.rated.values()
    }

    pub fn watchlist(&self) -> impl Iterator<Item = &WatchlistMovie> {
        self.watchlist.values()
    }

    /// Owned copy of the rated history
    pub fn history(&self) -> Vec<RatedMovie> {
        self.rated.values().cloned().collect()
    }

    pub fn rated_ids(&self) -> impl Iterator<Item = MovieId> + '_ {
        self.rated.keys().copied()
    }

    pub fn watchlist_ids(&self) -> impl Iterator<Item = MovieId> + '_ {
        self.watchlist.keys().copied()
    }

    /// Assigns a rating directly. Re-rating keeps the comparison count.
    /// Returns the previous entry, if any.
    pub fn rate(&mut self, movie: &CatalogMovie, rating: f64) -> EngineResult<Option<RatedMovie>> {
        let mut entry = RatedMovie::from_catalog(movie, rating)?;
        let previous = self.rated.get(&movie.id).cloned();
        if let Some(existing) = &previous {
            entry.comparison_count = existing.comparison_count;
        }
        self.watchlist.remove(&movie.id);
        self.rated.insert(movie.id, entry);
        Ok(previous)
    }

    /// Writes a comparison result for any movie, whichever list it came
    /// from: the rating is replaced, the comparison count incremented, and
    /// the movie inserted into the rated list if it was not there yet.
    pub fn apply_rating(&mut self, movie: &RatedMovie, new_rating: f64) -> EngineResult<RatedMovie> {
        let new_rating = validate_rating(new_rating)?;
        let mut updated = self.rated.get(&movie.id).cloned().unwrap_or_else(|| movie.clone());
        updated.user_rating = new_rating;
        updated.comparison_count += 1;

        tracing::debug!(
            movie_id = movie.id,
            title = %updated.title,
            rating = updated.user_rating,
            comparisons = updated.comparison_count,
            "Applied rating"
        );

        self.watchlist.remove(&movie.id);
        self.rated.insert(movie.id, updated.clone());
        Ok(updated)
    }

    /// Adds a movie to the watchlist. Returns false if it is already rated
    /// or already listed.
    pub fn add_to_watchlist(&mut self, movie: WatchlistMovie) -> bool {
        if self.rated.contains_key(&movie.id) || self.watchlist.contains_key(&movie.id) {
            return false;
        }
        self.watchlist.insert(movie.id, movie);
        true
    }

    pub fn remove_from_watchlist(&mut self, id: MovieId) -> Option<WatchlistMovie> {
        self.watchlist.remove(&id)
    }

    /// Puts a rated entry back to a recorded state (None removes it)
    pub fn restore_rated(&mut self, id: MovieId, entry: Option<RatedMovie>) {
        match entry {
            Some(movie) => {
                self.rated.insert(id, movie);
            }
            None => {
                self.rated.remove(&id);
            }
        }
    }

    /// Puts a watchlist entry back to a recorded state (None removes it)
    pub fn restore_watchlist(&mut self, id: MovieId, entry: Option<WatchlistMovie>) {
        match entry {
            Some(movie) => {
                self.watchlist.insert(id, movie);
            }
            None => {
                self.watchlist.remove(&id);
            }
        }
    }

    /// Highest rated movies first, optionally restricted to one genre
    pub fn top_rated(&self, genre: Option<GenreId>, limit: usize) -> Vec<&RatedMovie> {
        let mut movies: Vec<&RatedMovie> = self
            .rated
            .values()
            .filter(|m| genre.map_or(true, |g| m.has_genre(g)))
            .collect();
        movies.sort_by(|a, b| b.user_rating.total_cmp(&a.user_rating));
        movies.truncate(limit);
        movies
    }

    /// Watchlist ordered by catalog score, best first
    pub fn watchlist_by_score(&self) -> Vec<&WatchlistMovie> {
        let mut movies: Vec<&WatchlistMovie> = self.watchlist.values().collect();
        movies.sort_by(|a, b| b.vote_average.total_cmp(&a.vote_average));
        movies
    }

    /// Mean rating across the rated list, one decimal
    pub fn average_rating(&self) -> Option<f64> {
        if self.rated.is_empty() {
            return None;
        }
        let total: f64 = self.rated.values().map(|m| m.user_rating).sum();
        Some(round_to_tenth(total / self.rated.len() as f64))
    }

    /// Explicit user data reset
    pub fn clear(&mut self) {
        self.rated.clear();
        self.watchlist.clear();
    }
}
