//! TMDB v3 catalog provider
//!
//! Endpoints used:
//! - `/search/movie` for title search
//! - `/movie/{id}` for details (only the first three genres are kept)
//! - `/discover/movie` and `/movie/popular` for recommendation sampling
//!
//! Search results and details are cached in Redis when a store is attached.
use crate::{
    cached,
    config::Config,
    db::{RedisStore, StoreKey},
    error::{EngineError, EngineResult},
    models::{ApiMovieDetails, ApiMoviePage, CatalogMovie, MovieId},
    services::providers::{DiscoverFilters, DiscoverPage, MovieCatalog},
};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;

#[derive(Clone)]
pub struct TmdbCatalog {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Option<CatalogCache>,
}

#[derive(Clone)]
struct CatalogCache {
    store: RedisStore,
    namespace: String,
    ttl: u64,
}

impl TmdbCatalog {
    pub fn new(api_key: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key: api_key.into(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            cache: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.tmdb_api_key.clone(), config.tmdb_api_url.clone())
    }

    /// Client with a catalog cache using the configured namespace and TTL
    pub fn cached_from_config(config: &Config, store: RedisStore) -> Self {
        Self::from_config(config).with_cache(
            store,
            config.store_namespace.clone(),
            config.catalog_cache_ttl,
        )
    }

    /// Caches search results and details under the given namespace
    pub fn with_cache(mut self, store: RedisStore, namespace: impl Into<String>, ttl: u64) -> Self {
        self.cache = Some(CatalogCache {
            store,
            namespace: namespace.into(),
            ttl,
        });
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> EngineResult<T> {
        let response = self
            .http_client
            .get(self.url(path))
            .query(&[("api_key", self.api_key.as_str()), ("language", "en-US")])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::ExternalApi(format!(
                "TMDB API returned status {} for {}: {}",
                status, path, body
            )));
        }

        Ok(response.json().await?)
    }

    async fn fetch_search(&self, query: &str) -> EngineResult<Vec<CatalogMovie>> {
        let page: ApiMoviePage = self.fetch("/search/movie", &search_params(query)).await?;
        let movies: Vec<CatalogMovie> = page.results.into_iter().map(CatalogMovie::from).collect();

        tracing::info!(
            query = %query,
            results = movies.len(),
            provider = self.name(),
            "Title search completed"
        );

        Ok(movies)
    }

    async fn fetch_details(&self, id: MovieId) -> EngineResult<CatalogMovie> {
        let details: ApiMovieDetails = self.fetch(&format!("/movie/{}", id), &[]).await?;
        Ok(details.into())
    }

    async fn fetch_page(&self, path: &str, params: &[(&str, String)]) -> EngineResult<DiscoverPage> {
        let page: ApiMoviePage = self.fetch(path, params).await?;
        Ok(DiscoverPage {
            results: page.results.into_iter().map(CatalogMovie::from).collect(),
            total_pages: page.total_pages,
        })
    }
}

fn search_params(query: &str) -> Vec<(&'static str, String)> {
    vec![
        ("query", query.to_string()),
        ("include_adult", "false".to_string()),
        ("page", "1".to_string()),
    ]
}

fn discover_params(filters: &DiscoverFilters) -> Vec<(&'static str, String)> {
    let mut params = vec![("include_adult", "false".to_string())];

    if let Some(genre) = filters.genre {
        params.push(("with_genres", genre.to_string()));
    }
    if let Some(range) = &filters.date_range {
        params.push(("primary_release_date.gte", range.start()));
        params.push(("primary_release_date.lte", range.end()));
    }
    if let Some(sort_by) = filters.sort_by {
        params.push(("sort_by", sort_by.as_str().to_string()));
    }
    if let Some(min_votes) = filters.min_vote_count {
        params.push(("vote_count.gte", min_votes.to_string()));
    }
    params.push(("page", filters.page.unwrap_or(1).to_string()));

    params
}

#[async_trait::async_trait]
impl MovieCatalog for TmdbCatalog {
    async fn search_by_title(&self, query: &str) -> EngineResult<Vec<CatalogMovie>> {
        match &self.cache {
            Some(cache) => {
                let key = StoreKey::TitleSearch(query.to_string()).with_namespace(&cache.namespace);
                cached!(cache.store, key, cache.ttl, self.fetch_search(query))
            }
            None => self.fetch_search(query).await,
        }
    }

    async fn get_by_id(&self, id: MovieId) -> EngineResult<CatalogMovie> {
        match &self.cache {
            Some(cache) => {
                let key = StoreKey::MovieDetails(id).with_namespace(&cache.namespace);
                cached!(cache.store, key, cache.ttl, self.fetch_details(id))
            }
            None => self.fetch_details(id).await,
        }
    }

    async fn discover(&self, filters: &DiscoverFilters) -> EngineResult<DiscoverPage> {
        let page = self.fetch_page("/discover/movie", &discover_params(filters)).await?;

        tracing::debug!(
            genre = ?filters.genre,
            page = ?filters.page,
            results = page.results.len(),
            total_pages = page.total_pages,
            "Discover query completed"
        );

        Ok(page)
    }

    async fn popular(&self, page: u32) -> EngineResult<DiscoverPage> {
        self.fetch_page("/movie/popular", &[("page", page.to_string())])
            .await
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::{DateRange, SortBy};

    fn param<'a>(params: &'a [(&'static str, String)], name: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let catalog = TmdbCatalog::new("key", "http://test.local/3/");
        assert_eq!(catalog.url("/movie/603"), "http://test.local/3/movie/603");
        assert_eq!(catalog.name(), "tmdb");
    }

    #[test]
    fn test_search_params() {
        let params = search_params("The Matrix");
        assert_eq!(param(&params, "query"), Some("The Matrix"));
        assert_eq!(param(&params, "include_adult"), Some("false"));
    }

    #[test]
    fn test_discover_params_full() {
        let filters = DiscoverFilters {
            genre: Some(878),
            date_range: Some(DateRange {
                from_year: 1990,
                to_year: 2010,
            }),
            sort_by: Some(SortBy::PopularityDesc),
            min_vote_count: Some(500),
            page: Some(7),
        };
        let params = discover_params(&filters);

        assert_eq!(param(&params, "with_genres"), Some("878"));
        assert_eq!(param(&params, "primary_release_date.gte"), Some("1990-01-01"));
        assert_eq!(param(&params, "primary_release_date.lte"), Some("2010-12-31"));
        assert_eq!(param(&params, "sort_by"), Some("popularity.desc"));
        assert_eq!(param(&params, "vote_count.gte"), Some("500"));
        assert_eq!(param(&params, "page"), Some("7"));
    }

    #[test]
    fn test_discover_params_defaults() {
        let params = discover_params(&DiscoverFilters::default());
        assert_eq!(param(&params, "with_genres"), None);
        assert_eq!(param(&params, "sort_by"), None);
        assert_eq!(param(&params, "page"), Some("1"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let catalog = TmdbCatalog::new("key", "http://127.0.0.1:9");
        let result = catalog.get_by_id(603).await;
        assert!(matches!(result, Err(EngineError::Network(_))));
    }
}
