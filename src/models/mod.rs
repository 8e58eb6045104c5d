use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

pub mod baseline;
pub mod genre;
pub mod library;
pub mod movie;
pub mod sequencer_state;

pub use baseline::{BaselineList, BaselineMovie};
pub use genre::GenreTable;
pub use library::MovieLibrary;
pub use movie::{RatedMovie, WatchlistMovie};
pub use sequencer_state::SequencerState;

/// Stable TMDB catalog identifier
pub type MovieId = u64;

/// TMDB genre code
pub type GenreId = u32;

/// Extracts the year from a `YYYY-MM-DD` release date
pub fn release_year(release_date: Option<&str>) -> Option<i32> {
    release_date
        .and_then(|date| NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok())
        .map(|date| date.year())
}

/// Rounds a rating to one decimal place
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// A movie as returned by the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogMovie {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<GenreId>,
    #[serde(default)]
    pub overview: Option<String>,
}

impl CatalogMovie {
    pub fn release_year(&self) -> Option<i32> {
        release_year(self.release_date.as_deref())
    }

    pub fn has_genre(&self, genre: GenreId) -> bool {
        self.genre_ids.contains(&genre)
    }

    /// Initial rating for a movie the user has not rated yet: the catalog
    /// score, pulled into the 1-10 range
    pub fn initial_rating(&self) -> f64 {
        self.vote_average.clamp(1.0, 10.0)
    }
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Movie entry in TMDB list responses (search, discover, popular)
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMovie {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<u64>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<GenreId>,
    #[serde(default)]
    pub overview: Option<String>,
}

impl From<ApiMovie> for CatalogMovie {
    fn from(movie: ApiMovie) -> Self {
        CatalogMovie {
            id: movie.id,
            title: movie.title,
            poster_path: movie.poster_path.filter(|p| !p.is_empty()),
            vote_average: movie.vote_average.unwrap_or_default(),
            vote_count: movie.vote_count.unwrap_or_default(),
            release_date: movie.release_date.filter(|d| !d.is_empty()),
            genre_ids: movie.genre_ids,
            overview: movie.overview,
        }
    }
}

/// Paged TMDB list response
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMoviePage {
    #[serde(default)]
    pub results: Vec<ApiMovie>,
    #[serde(default)]
    pub total_pages: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiGenre {
    pub id: GenreId,
    #[allow(dead_code)]
    pub name: String,
}

/// TMDB `/movie/{id}` response
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMovieDetails {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<u64>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub genres: Vec<ApiGenre>,
    #[serde(default)]
    pub overview: Option<String>,
}

/// Details responses only keep the leading genres
const MAX_DETAIL_GENRES: usize = 3;

impl From<ApiMovieDetails> for CatalogMovie {
    fn from(details: ApiMovieDetails) -> Self {
        CatalogMovie {
            id: details.id,
            title: details.title,
            poster_path: details.poster_path.filter(|p| !p.is_empty()),
            vote_average: details.vote_average.unwrap_or_default(),
            vote_count: details.vote_count.unwrap_or_default(),
            release_date: details.release_date.filter(|d| !d.is_empty()),
            genre_ids: details
                .genres
                .into_iter()
                .map(|g| g.id)
                .take(MAX_DETAIL_GENRES)
                .collect(),
            overview: details.overview,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_year_parsing() {
        assert_eq!(release_year(Some("1999-03-31")), Some(1999));
        assert_eq!(release_year(Some("Unknown")), None);
        assert_eq!(release_year(Some("")), None);
        assert_eq!(release_year(None), None);
    }

    #[test]
    fn test_round_to_tenth() {
        assert_eq!(round_to_tenth(8.66), 8.7);
        assert_eq!(round_to_tenth(5.349), 5.3);
        assert_eq!(round_to_tenth(10.0), 10.0);
    }

    #[test]
    fn test_api_movie_to_catalog_movie() {
        let json = r#"{
            "id": 603,
            "title": "The Matrix",
            "poster_path": "/f89U3ADr1oiB1s9GkdPOEpXUk5H.jpg",
            "vote_average": 8.2,
            "vote_count": 25000,
            "release_date": "1999-03-31",
            "genre_ids": [28, 878],
            "overview": "Set in the 22nd century"
        }"#;

        let api: ApiMovie = serde_json::from_str(json).unwrap();
        let movie: CatalogMovie = api.into();
        assert_eq!(movie.id, 603);
        assert_eq!(movie.release_year(), Some(1999));
        assert_eq!(movie.genre_ids, vec![28, 878]);
        assert!(movie.has_genre(878));
    }

    #[test]
    fn test_api_movie_missing_fields() {
        let json = r#"{"id": 1, "title": "Obscure", "poster_path": null, "release_date": ""}"#;
        let movie: CatalogMovie = serde_json::from_str::<ApiMovie>(json).unwrap().into();
        assert_eq!(movie.poster_path, None);
        assert_eq!(movie.release_date, None);
        assert_eq!(movie.vote_count, 0);
        assert_eq!(movie.initial_rating(), 1.0);
    }

    #[test]
    fn test_details_keep_first_three_genres() {
        let json = r#"{
            "id": 155,
            "title": "The Dark Knight",
            "vote_average": 8.5,
            "vote_count": 30000,
            "release_date": "2008-07-16",
            "genres": [
                {"id": 18, "name": "Drama"},
                {"id": 28, "name": "Action"},
                {"id": 80, "name": "Crime"},
                {"id": 53, "name": "Thriller"}
            ]
        }"#;

        let movie: CatalogMovie = serde_json::from_str::<ApiMovieDetails>(json)
            .unwrap()
            .into();
        assert_eq!(movie.genre_ids, vec![18, 28, 80]);
        assert_eq!(movie.initial_rating(), 8.5);
    }
}
