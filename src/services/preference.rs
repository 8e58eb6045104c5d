use std::collections::{BTreeMap, BTreeSet};

use crate::models::{GenreId, GenreTable, RatedMovie};

/// Rating treated as neither liked nor disliked
const NEUTRAL_RATING: f64 = 5.0;

/// Ratings at or above this count towards the preferred era
const ERA_RATING_FLOOR: f64 = 7.0;

/// Genre and release-era preferences derived from a rated history.
///
/// An empty history yields an empty profile, which callers treat as "no
/// signal" rather than an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferenceProfile {
    /// Sum of ratings of the movies carrying each genre
    pub genre_affinity: BTreeMap<GenreId, f64>,
    /// Sum of `(rating - 5) / 5` per genre; below-neutral ratings subtract
    pub centered_affinity: BTreeMap<GenreId, f64>,
    /// Weighted mean release year of highly rated movies
    pub preferred_era_year: Option<f64>,
}

impl PreferenceProfile {
    pub fn derive(history: &[RatedMovie]) -> Self {
        let mut genre_affinity = BTreeMap::new();
        let mut centered_affinity = BTreeMap::new();
        let mut total_weight = 0.0;
        let mut weighted_years = 0.0;

        for movie in history {
            let rating = movie.user_rating;
            let centered = (rating - NEUTRAL_RATING) / NEUTRAL_RATING;

            // Duplicate genre codes in source data count once
            let genres: BTreeSet<GenreId> = movie.genre_ids.iter().copied().collect();
            for genre in genres {
                *genre_affinity.entry(genre).or_insert(0.0) += rating;
                *centered_affinity.entry(genre).or_insert(0.0) += centered;
            }

            if rating >= ERA_RATING_FLOOR {
                if let Some(year) = movie.release_year() {
                    let weight = (rating - ERA_RATING_FLOOR) * 3.0;
                    total_weight += weight;
                    weighted_years += f64::from(year) * weight;
                }
            }
        }

        let preferred_era_year = (total_weight > 0.0).then(|| weighted_years / total_weight);

        Self {
            genre_affinity,
            centered_affinity,
            preferred_era_year,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.genre_affinity.is_empty() && self.preferred_era_year.is_none()
    }

    /// Genre with the highest raw affinity; ties go to the lower code
    pub fn favorite_genre(&self) -> Option<GenreId> {
        self.genre_affinity
            .iter()
            .filter(|(_, score)| **score > 0.0)
            .fold(None, |best: Option<(GenreId, f64)>, (genre, score)| match best {
                Some((_, best_score)) if best_score >= *score => best,
                _ => Some((*genre, *score)),
            })
            .map(|(genre, _)| genre)
    }

    /// Raw affinity summed over a movie's distinct genres
    pub fn raw_affinity(&self, genres: &[GenreId]) -> f64 {
        Self::sum_over(&self.genre_affinity, genres)
    }

    /// Centered affinity summed over a movie's distinct genres
    pub fn centered_affinity_for(&self, genres: &[GenreId]) -> f64 {
        Self::sum_over(&self.centered_affinity, genres)
    }

    fn sum_over(scores: &BTreeMap<GenreId, f64>, genres: &[GenreId]) -> f64 {
        let distinct: BTreeSet<&GenreId> = genres.iter().collect();
        distinct
            .into_iter()
            .filter_map(|genre| scores.get(genre))
            .sum()
    }
}

/// Per-genre summary of the user's ratings
#[derive(Debug, Clone, PartialEq)]
pub struct GenreInsight {
    pub id: GenreId,
    pub name: String,
    pub average_rating: f64,
    pub movie_count: usize,
}

const MIN_GENRE_MOVIES: usize = 2;
const TOP_GENRE_LIMIT: usize = 5;

/// Best-liked genres by average rating, among genres with at least two
/// rated movies
pub fn top_genres(history: &[RatedMovie], genres: &GenreTable) -> Vec<GenreInsight> {
    let mut totals: BTreeMap<GenreId, (f64, usize)> = BTreeMap::new();

    for movie in history {
        let distinct: BTreeSet<GenreId> = movie.genre_ids.iter().copied().collect();
        for genre in distinct {
            let entry = totals.entry(genre).or_insert((0.0, 0));
            entry.0 += movie.user_rating;
            entry.1 += 1;
        }
    }

    let mut insights: Vec<GenreInsight> = totals
        .into_iter()
        .filter(|(_, (_, count))| *count >= MIN_GENRE_MOVIES)
        .map(|(id, (total, count))| GenreInsight {
            id,
            name: genres.display_name(id).to_string(),
            average_rating: total / count as f64,
            movie_count: count,
        })
        .collect();

    insights.sort_by(|a, b| b.average_rating.total_cmp(&a.average_rating));
    insights.truncate(TOP_GENRE_LIMIT);
    insights
}
