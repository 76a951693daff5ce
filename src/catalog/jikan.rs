// Jikan v4 client: unauthenticated REST over HTTP.
//
// Jikan (api.jikan.moe) is an unofficial read-only mirror of MyAnimeList.
// All endpoints used here are public GETs. Each call is throttled through the
// rate limiter, and every failure degrades to an empty result at the
// CatalogSource boundary so a flaky API never crashes a recommendation.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::rate_limiter::RateLimiter;
use super::records::{lenient_items, CatalogRecord, GenreEntry, PaginationInfo};
use super::{CatalogSource, GenreMap, GenreResults};

/// Default Jikan API endpoint.
pub const DEFAULT_JIKAN_API_URL: &str = "https://api.jikan.moe/v4";

/// How many hits a title search asks for.
const TITLE_SEARCH_LIMIT: &str = "5";

/// HTTP client for the Jikan REST API.
pub struct JikanClient {
    client: reqwest::Client,
    base_url: String,
    limiter: RateLimiter,
}

impl JikanClient {
    /// Create a client pointing at the given base URL, spacing requests by
    /// `request_delay`.
    pub fn new(base_url: &str, request_delay: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("anirec/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter: RateLimiter::new(request_delay),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a Jikan path and deserialize the response body.
    ///
    /// `path` is relative to the base URL (e.g. "/anime/1/full").
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);

        self.limiter.acquire().await;
        debug!(path = path, "Jikan GET request");

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .with_context(|| format!("Jikan request failed: {path}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Jikan {path} returned {status}: {body}");
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to deserialize Jikan {path} response"))
    }

    async fn try_search_by_title(&self, query: &str) -> Result<Vec<CatalogRecord>> {
        let resp: ListResponse = self
            .get_json(
                "/anime",
                &[("q", query), ("limit", TITLE_SEARCH_LIMIT), ("sfw", "true")],
            )
            .await?;
        Ok(resp.data)
    }

    async fn try_get_detail(&self, id: u64) -> Result<Option<CatalogRecord>> {
        let resp: DetailResponse = self.get_json(&format!("/anime/{id}/full"), &[]).await?;
        Ok(resp.data)
    }

    async fn try_get_recommendations(&self, id: u64) -> Result<Vec<CatalogRecord>> {
        let resp: RecommendationsResponse = self
            .get_json(&format!("/anime/{id}/recommendations"), &[])
            .await?;
        Ok(resp.into_records())
    }

    async fn try_get_genre_map(&self) -> Result<GenreMap> {
        let resp: GenresResponse = self.get_json("/genres/anime", &[]).await?;
        Ok(resp.into_map())
    }

    async fn try_search_by_genre(
        &self,
        genre_id: u64,
        page: u32,
        limit: u32,
    ) -> Result<GenreResults> {
        let genre_id = genre_id.to_string();
        let page = page.to_string();
        let limit = limit.to_string();
        let resp: ListResponse = self
            .get_json(
                "/anime",
                &[
                    ("genres", genre_id.as_str()),
                    ("page", page.as_str()),
                    ("limit", limit.as_str()),
                    ("sfw", "true"),
                    ("order_by", "score"),
                    ("sort", "desc"),
                ],
            )
            .await?;
        Ok(GenreResults {
            records: resp.data,
            pagination: resp.pagination,
        })
    }
}

#[async_trait]
impl CatalogSource for JikanClient {
    async fn search_by_title(&self, query: &str) -> Vec<CatalogRecord> {
        self.try_search_by_title(query).await.unwrap_or_else(|e| {
            warn!(query = query, error = %e, "Title search failed");
            Vec::new()
        })
    }

    async fn get_detail_by_id(&self, id: u64) -> Option<CatalogRecord> {
        self.try_get_detail(id).await.unwrap_or_else(|e| {
            warn!(id = id, error = %e, "Detail fetch failed");
            None
        })
    }

    async fn get_recommendations(&self, id: u64) -> Vec<CatalogRecord> {
        self.try_get_recommendations(id).await.unwrap_or_else(|e| {
            warn!(id = id, error = %e, "Recommendation fetch failed");
            Vec::new()
        })
    }

    async fn get_genre_map(&self) -> GenreMap {
        self.try_get_genre_map().await.unwrap_or_else(|e| {
            warn!(error = %e, "Genre list fetch failed");
            GenreMap::new()
        })
    }

    async fn search_by_genre(&self, genre_id: u64, page: u32, limit: u32) -> GenreResults {
        self.try_search_by_genre(genre_id, page, limit)
            .await
            .unwrap_or_else(|e| {
                warn!(genre_id = genre_id, page = page, error = %e, "Genre search failed");
                GenreResults::default()
            })
    }

    fn name(&self) -> &'static str {
        "jikan"
    }
}

// -- Serde types for Jikan response envelopes --

/// `GET /anime` (search and genre listing).
#[derive(Debug, Deserialize)]
pub struct ListResponse {
    #[serde(default, deserialize_with = "lenient_items")]
    pub data: Vec<CatalogRecord>,
    #[serde(default)]
    pub pagination: Option<PaginationInfo>,
}

/// `GET /anime/{id}/full`.
#[derive(Debug, Deserialize)]
pub struct DetailResponse {
    #[serde(default)]
    pub data: Option<CatalogRecord>,
}

/// `GET /anime/{id}/recommendations`. Each item wraps the recommended anime
/// in an `entry` object alongside vote metadata we don't use.
#[derive(Debug, Deserialize)]
pub struct RecommendationsResponse {
    #[serde(default, deserialize_with = "lenient_items")]
    pub data: Vec<RecommendationItem>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationItem {
    #[serde(default)]
    pub entry: Option<CatalogRecord>,
}

impl RecommendationsResponse {
    /// Unwrap the entries, dropping items that had none.
    pub fn into_records(self) -> Vec<CatalogRecord> {
        self.data.into_iter().filter_map(|item| item.entry).collect()
    }
}

/// `GET /genres/anime`.
#[derive(Debug, Deserialize)]
pub struct GenresResponse {
    #[serde(default, deserialize_with = "lenient_items")]
    pub data: Vec<GenreEntry>,
}

impl GenresResponse {
    /// Build the lowercased name -> id map, skipping entries missing either.
    pub fn into_map(self) -> GenreMap {
        self.data
            .into_iter()
            .filter_map(|g| Some((g.name?.to_lowercase(), g.mal_id?)))
            .collect::<HashMap<_, _>>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = JikanClient::new("https://api.jikan.moe/v4/", Duration::ZERO).unwrap();
        assert_eq!(client.base_url(), "https://api.jikan.moe/v4");
    }

    #[test]
    fn test_recommendations_skip_missing_entries() {
        let json = r#"{"data": [
            {"entry": {"mal_id": 1, "title": "Cowboy Bebop"}, "votes": 12},
            {"votes": 3},
            {"entry": null}
        ]}"#;
        let resp: RecommendationsResponse = serde_json::from_str(json).unwrap();
        let records = resp.into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].mal_id, Some(1));
    }

    #[test]
    fn test_genre_map_lowercases_and_skips_incomplete() {
        let json = r#"{"data": [
            {"mal_id": 1, "name": "Action"},
            {"mal_id": 24, "name": "Sci-Fi"},
            {"name": "NoId"},
            {"mal_id": 99}
        ]}"#;
        let resp: GenresResponse = serde_json::from_str(json).unwrap();
        let map = resp.into_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("action"), Some(&1));
        assert_eq!(map.get("sci-fi"), Some(&24));
    }
}
