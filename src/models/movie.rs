use serde::{Deserialize, Serialize};

use super::{release_year, round_to_tenth, CatalogMovie, GenreId, MovieId};
use crate::error::{EngineError, EngineResult};

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 10.0;

/// Rejects ratings outside [1, 10] (and non-finite values)
pub fn validate_rating(rating: f64) -> EngineResult<f64> {
    if rating.is_finite() && (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(rating)
    } else {
        Err(EngineError::InvalidRating(rating))
    }
}

/// A movie the user has scored
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatedMovie {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<GenreId>,
    #[serde(default)]
    pub release_date: Option<String>,
    /// Score in [1, 10]
    pub user_rating: f64,
    /// Pairwise comparisons since the movie was first rated
    #[serde(default, alias = "gamesPlayed")]
    pub comparison_count: u32,
}

impl RatedMovie {
    /// Rates a catalog movie directly; the rating is rounded to one decimal
    pub fn from_catalog(movie: &CatalogMovie, rating: f64) -> EngineResult<Self> {
        let rating = validate_rating(rating)?;
        Ok(Self {
            id: movie.id,
            title: movie.title.clone(),
            poster_path: movie.poster_path.clone(),
            genre_ids: movie.genre_ids.clone(),
            release_date: movie.release_date.clone(),
            user_rating: round_to_tenth(rating),
            comparison_count: 0,
        })
    }

    /// Unrated candidate entering its first comparison at the catalog score
    pub fn provisional(movie: &CatalogMovie) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            poster_path: movie.poster_path.clone(),
            genre_ids: movie.genre_ids.clone(),
            release_date: movie.release_date.clone(),
            user_rating: movie.initial_rating(),
            comparison_count: 0,
        }
    }

    pub fn release_year(&self) -> Option<i32> {
        release_year(self.release_date.as_deref())
    }

    pub fn has_genre(&self, genre: GenreId) -> bool {
        self.genre_ids.contains(&genre)
    }
}

/// A movie the user intends to watch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchlistMovie {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<GenreId>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub overview: Option<String>,
}

impl WatchlistMovie {
    pub fn release_year(&self) -> Option<i32> {
        release_year(self.release_date.as_deref())
    }

    /// Catalog view of the entry, used when rating it
    pub fn to_catalog(&self) -> CatalogMovie {
        CatalogMovie {
            id: self.id,
            title: self.title.clone(),
            poster_path: self.poster_path.clone(),
            vote_average: self.vote_average,
            vote_count: 0,
            release_date: self.release_date.clone(),
            genre_ids: self.genre_ids.clone(),
            overview: self.overview.clone(),
        }
    }
}

impl From<CatalogMovie> for WatchlistMovie {
    fn from(movie: CatalogMovie) -> Self {
        Self {
            id: movie.id,
            title: movie.title,
            poster_path: movie.poster_path,
            genre_ids: movie.genre_ids,
            release_date: movie.release_date,
            vote_average: movie.vote_average,
            overview: movie.overview,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_movie() -> CatalogMovie {
        CatalogMovie {
            id: 27205,
            title: "Inception".to_string(),
            poster_path: Some("/inception.jpg".to_string()),
            vote_average: 8.4,
            vote_count: 35000,
            release_date: Some("2010-07-15".to_string()),
            genre_ids: vec![28, 878, 12],
            overview: None,
        }
    }

    #[test]
    fn test_from_catalog_rounds_rating() {
        let rated = RatedMovie::from_catalog(&catalog_movie(), 7.26).unwrap();
        assert_eq!(rated.user_rating, 7.3);
        assert_eq!(rated.comparison_count, 0);
        assert_eq!(rated.release_year(), Some(2010));
    }

    #[test]
    fn test_from_catalog_rejects_out_of_range() {
        assert!(matches!(
            RatedMovie::from_catalog(&catalog_movie(), 10.5),
            Err(EngineError::InvalidRating(_))
        ));
        assert!(matches!(
            RatedMovie::from_catalog(&catalog_movie(), f64::NAN),
            Err(EngineError::InvalidRating(_))
        ));
    }

    #[test]
    fn test_provisional_uses_catalog_score() {
        let rated = RatedMovie::provisional(&catalog_movie());
        assert_eq!(rated.user_rating, 8.4);
        assert!(rated.has_genre(878));
    }

    #[test]
    fn test_legacy_games_played_field() {
        let json = r#"{"id": 1, "title": "Heat", "user_rating": 8.0, "gamesPlayed": 4}"#;
        let rated: RatedMovie = serde_json::from_str(json).unwrap();
        assert_eq!(rated.comparison_count, 4);
    }

    #[test]
    fn test_watchlist_round_trip_keeps_metadata() {
        let entry = WatchlistMovie::from(catalog_movie());
        assert_eq!(entry.to_catalog().genre_ids, vec![28, 878, 12]);
        assert_eq!(entry.release_year(), Some(2010));
    }
}
