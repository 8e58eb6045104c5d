/// Movie catalog abstraction
///
/// The engine only ever reads from the catalog: title search, details by
/// id, and the discover/popular listings the recommender samples from.
use crate::{
    error::EngineResult,
    models::{CatalogMovie, GenreId, MovieId},
};

pub mod tmdb;

pub use tmdb::TmdbCatalog;

/// Sort orders supported by discover queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    VoteAverageDesc,
    PopularityDesc,
    ReleaseDateDesc,
}

impl SortBy {
    pub const ALL: [SortBy; 3] = [
        SortBy::VoteAverageDesc,
        SortBy::PopularityDesc,
        SortBy::ReleaseDateDesc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::VoteAverageDesc => "vote_average.desc",
            SortBy::PopularityDesc => "popularity.desc",
            SortBy::ReleaseDateDesc => "primary_release_date.desc",
        }
    }
}

/// Release date window, inclusive, as `YYYY-MM-DD` bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub from_year: i32,
    pub to_year: i32,
}

impl DateRange {
    pub fn start(&self) -> String {
        format!("{}-01-01", self.from_year)
    }

    pub fn end(&self) -> String {
        format!("{}-12-31", self.to_year)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoverFilters {
    pub genre: Option<GenreId>,
    pub date_range: Option<DateRange>,
    pub sort_by: Option<SortBy>,
    pub min_vote_count: Option<u64>,
    pub page: Option<u32>,
}

/// One page of a listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoverPage {
    pub results: Vec<CatalogMovie>,
    pub total_pages: u32,
}

/// Read access to a movie catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Movies whose title matches the query, in catalog order
    async fn search_by_title(&self, query: &str) -> EngineResult<Vec<CatalogMovie>>;

    async fn get_by_id(&self, id: MovieId) -> EngineResult<CatalogMovie>;

    async fn discover(&self, filters: &DiscoverFilters) -> EngineResult<DiscoverPage>;

    /// Currently popular movies, one page at a time
    async fn popular(&self, page: u32) -> EngineResult<DiscoverPage>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_params() {
        let params: Vec<&str> = SortBy::ALL.iter().map(SortBy::as_str).collect();
        assert_eq!(
            params,
            vec!["vote_average.desc", "popularity.desc", "primary_release_date.desc"]
        );
    }

    #[test]
    fn test_date_range_bounds() {
        let range = DateRange {
            from_year: 1989,
            to_year: 2009,
        };
        assert_eq!(range.start(), "1989-01-01");
        assert_eq!(range.end(), "2009-12-31");
    }
}
