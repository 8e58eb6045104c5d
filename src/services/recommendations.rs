use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{Datelike, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::preference::PreferenceProfile;
use super::providers::{DateRange, DiscoverFilters, MovieCatalog, SortBy};
use crate::error::{EngineError, EngineResult};
use crate::models::{CatalogMovie, GenreId, MovieId, RatedMovie};

/// Input for picking one personalized comparison candidate
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRequest {
    pub history: Vec<RatedMovie>,
    /// Rated, watchlisted, compared and skipped movies
    pub excluded_ids: BTreeSet<MovieId>,
    pub genre_filter: Option<GenreId>,
    pub min_score: f64,
    pub min_vote_count: u64,
}

/// Supplies candidates once the baseline phase is over
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationSource: Send + Sync {
    /// One catalog movie the user has not seen, or `NoCandidatesFound`
    async fn recommend(&self, request: &RecommendationRequest) -> EngineResult<CatalogMovie>;
}

/// Movies considered when deriving taste for discovery
const PROFILE_SAMPLE: usize = 10;
/// Years either side of the preferred era
const ERA_WINDOW: i32 = 10;
const EARLIEST_YEAR: i32 = 1900;
/// Deepest discover page sampled
const MAX_DISCOVER_PAGE: u32 = 20;
const POPULAR_PAGES: u32 = 20;
const MAX_CANDIDATE_GENRES: usize = 3;

/// Recommendation source backed by the catalog's discover and popular
/// listings, steered by the user's favorite genre and era.
pub struct DiscoverRecommender {
    catalog: Arc<dyn MovieCatalog>,
    rng: Mutex<StdRng>,
}

impl DiscoverRecommender {
    pub fn new(catalog: Arc<dyn MovieCatalog>) -> Self {
        Self::with_rng(catalog, StdRng::from_entropy())
    }

    pub fn with_rng(catalog: Arc<dyn MovieCatalog>, rng: StdRng) -> Self {
        Self {
            catalog,
            rng: Mutex::new(rng),
        }
    }

    fn with_rng_locked<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }

    fn filters_for(&self, request: &RecommendationRequest) -> DiscoverFilters {
        let mut top: Vec<RatedMovie> = request.history.clone();
        top.sort_by(|a, b| b.user_rating.total_cmp(&a.user_rating));
        top.truncate(PROFILE_SAMPLE);

        let profile = PreferenceProfile::derive(&top);
        let genre = request.genre_filter.or_else(|| profile.favorite_genre());

        let date_range = profile.preferred_era_year.map(|era| {
            let era = era.round() as i32;
            DateRange {
                from_year: (era - ERA_WINDOW).max(EARLIEST_YEAR),
                to_year: (era + ERA_WINDOW).min(Utc::now().year()),
            }
        });

        let sort_by = self.with_rng_locked(|rng| SortBy::ALL.choose(rng).copied());

        DiscoverFilters {
            genre,
            date_range,
            sort_by,
            min_vote_count: Some(request.min_vote_count),
            page: Some(1),
        }
    }

    fn pick(&self, candidates: Vec<CatalogMovie>) -> Option<CatalogMovie> {
        let mut movie = self.with_rng_locked(|rng| candidates.choose(rng).cloned())?;
        movie.genre_ids.truncate(MAX_CANDIDATE_GENRES);
        Some(movie)
    }

    async fn from_discover(&self, request: &RecommendationRequest) -> EngineResult<Option<CatalogMovie>> {
        let mut filters = self.filters_for(request);
        let first = self.catalog.discover(&filters).await?;

        let max_page = first.total_pages.clamp(1, MAX_DISCOVER_PAGE);
        let page_number = self.with_rng_locked(|rng| rng.gen_range(1..=max_page));

        let page = if page_number == 1 {
            first
        } else {
            filters.page = Some(page_number);
            self.catalog.discover(&filters).await?
        };

        tracing::debug!(
            genre = ?filters.genre,
            sort = ?filters.sort_by,
            page = page_number,
            results = page.results.len(),
            "Sampled discover page"
        );

        let eligible: Vec<CatalogMovie> = page
            .results
            .into_iter()
            .filter(|m| {
                m.poster_path.is_some()
                    && m.vote_average >= request.min_score
                    && m.vote_count >= request.min_vote_count
                    && !request.excluded_ids.contains(&m.id)
            })
            .collect();

        Ok(self.pick(eligible))
    }

    async fn from_popular(&self, request: &RecommendationRequest) -> EngineResult<Option<CatalogMovie>> {
        let page_number = self.with_rng_locked(|rng| rng.gen_range(1..=POPULAR_PAGES));
        let page = self.catalog.popular(page_number).await?;

        let eligible: Vec<CatalogMovie> = page
            .results
            .into_iter()
            .filter(|m| m.poster_path.is_some() && !request.excluded_ids.contains(&m.id))
            .collect();

        Ok(self.pick(eligible))
    }
}

#[async_trait::async_trait]
impl RecommendationSource for DiscoverRecommender {
    async fn recommend(&self, request: &RecommendationRequest) -> EngineResult<CatalogMovie> {
        if request.history.is_empty() {
            return Err(EngineError::InsufficientData { found: 0 });
        }

        if let Some(movie) = self.from_discover(request).await? {
            return Ok(movie);
        }

        tracing::info!(
            provider = self.catalog.name(),
            "No eligible discover results, falling back to popular movies"
        );

        self.from_popular(request)
            .await?
            .ok_or(EngineError::NoCandidatesFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::{DiscoverPage, MockMovieCatalog};

    fn rated(id: MovieId, rating: f64, genres: Vec<GenreId>, year: &str) -> RatedMovie {
        RatedMovie {
            id,
            title: format!("Rated {}", id),
            poster_path: None,
            genre_ids: genres,
            release_date: Some(format!("{}-01-01", year)),
            user_rating: rating,
            comparison_count: 0,
        }
    }

    fn catalog_movie(id: MovieId, score: f64, votes: u64) -> CatalogMovie {
        CatalogMovie {
            id,
            title: format!("Movie {}", id),
            poster_path: Some(format!("/{}.jpg", id)),
            vote_average: score,
            vote_count: votes,
            release_date: Some("2005-01-01".to_string()),
            genre_ids: vec![878, 28, 12, 53],
            overview: None,
        }
    }

    fn request(history: Vec<RatedMovie>, excluded: &[MovieId]) -> RecommendationRequest {
        RecommendationRequest {
            history,
            excluded_ids: excluded.iter().copied().collect(),
            genre_filter: None,
            min_score: 7.0,
            min_vote_count: 500,
        }
    }

    fn recommender(catalog: MockMovieCatalog) -> DiscoverRecommender {
        DiscoverRecommender::with_rng(Arc::new(catalog), StdRng::seed_from_u64(7))
    }

    #[tokio::test]
    async fn test_empty_history_rejected() {
        let result = recommender(MockMovieCatalog::new())
            .recommend(&request(vec![], &[]))
            .await;
        assert!(matches!(result, Err(EngineError::InsufficientData { found: 0 })));
    }

    #[tokio::test]
    async fn test_discover_uses_favorite_genre_and_era() {
        let mut catalog = MockMovieCatalog::new();
        catalog
            .expect_discover()
            .withf(|filters| {
                let range = filters.date_range.as_ref();
                filters.genre == Some(878)
                    && filters.min_vote_count == Some(500)
                    && range.map(|r| (r.from_year, r.to_year)) == Some((1990, 2010))
            })
            .returning(|_| {
                Ok(DiscoverPage {
                    results: vec![catalog_movie(10, 7.5, 800)],
                    total_pages: 1,
                })
            });

        let history = vec![
            rated(1, 9.0, vec![878], "2000"),
            rated(2, 8.0, vec![878, 18], "2000"),
            rated(3, 4.0, vec![35], "1970"),
        ];
        let movie = recommender(catalog)
            .recommend(&request(history, &[1, 2, 3]))
            .await
            .unwrap();

        assert_eq!(movie.id, 10);
        assert_eq!(movie.genre_ids, vec![878, 28, 12]);
    }

    #[tokio::test]
    async fn test_genre_filter_overrides_favorite() {
        let mut catalog = MockMovieCatalog::new();
        catalog
            .expect_discover()
            .withf(|filters| filters.genre == Some(27))
            .returning(|_| {
                Ok(DiscoverPage {
                    results: vec![catalog_movie(10, 7.5, 800)],
                    total_pages: 1,
                })
            });

        let mut req = request(vec![rated(1, 9.0, vec![878], "2000")], &[1]);
        req.genre_filter = Some(27);

        assert!(recommender(catalog).recommend(&req).await.is_ok());
    }

    #[tokio::test]
    async fn test_falls_back_to_popular_when_discover_filtered_out() {
        let mut catalog = MockMovieCatalog::new();
        catalog.expect_discover().returning(|_| {
            Ok(DiscoverPage {
                results: vec![
                    // Excluded, low score, too few votes, no poster
                    catalog_movie(1, 9.0, 900),
                    catalog_movie(20, 6.0, 900),
                    catalog_movie(21, 8.0, 100),
                    CatalogMovie {
                        poster_path: None,
                        ..catalog_movie(22, 8.0, 900)
                    },
                ],
                total_pages: 1,
            })
        });
        catalog.expect_name().return_const("mock");
        catalog
            .expect_popular()
            .withf(|page| (1..=20).contains(page))
            .returning(|_| {
                Ok(DiscoverPage {
                    results: vec![catalog_movie(1, 9.0, 900), catalog_movie(30, 5.0, 10)],
                    total_pages: 500,
                })
            });

        let movie = recommender(catalog)
            .recommend(&request(vec![rated(1, 9.0, vec![878], "2000")], &[1]))
            .await
            .unwrap();

        assert_eq!(movie.id, 30);
    }

    #[tokio::test]
    async fn test_no_candidates_anywhere() {
        let mut catalog = MockMovieCatalog::new();
        catalog
            .expect_discover()
            .returning(|_| Ok(DiscoverPage::default()));
        catalog.expect_name().return_const("mock");
        catalog
            .expect_popular()
            .returning(|_| Ok(DiscoverPage::default()));

        let result = recommender(catalog)
            .recommend(&request(vec![rated(1, 9.0, vec![878], "2000")], &[1]))
            .await;

        assert!(matches!(result, Err(EngineError::NoCandidatesFound)));
    }

    #[tokio::test]
    async fn test_catalog_errors_propagate() {
        let mut catalog = MockMovieCatalog::new();
        catalog
            .expect_discover()
            .returning(|_| Err(EngineError::ExternalApi("TMDB API returned status 503".to_string())));

        let result = recommender(catalog)
            .recommend(&request(vec![rated(1, 9.0, vec![878], "2000")], &[1]))
            .await;

        assert!(matches!(result, Err(EngineError::ExternalApi(_))));
    }

    #[tokio::test]
    async fn test_random_page_within_first_twenty() {
        let mut catalog = MockMovieCatalog::new();
        catalog
            .expect_discover()
            .withf(|filters| filters.page.map_or(false, |p| (1..=20).contains(&p)))
            .returning(|_| {
                Ok(DiscoverPage {
                    results: vec![catalog_movie(10, 7.5, 800)],
                    total_pages: 400,
                })
            });

        let movie = recommender(catalog)
            .recommend(&request(vec![rated(1, 9.0, vec![878], "2000")], &[1]))
            .await
            .unwrap();
        assert_eq!(movie.id, 10);
    }
}
