// Catalog sources: where anime records come from.
//
// The recommenders never talk to the network directly. They go through the
// CatalogSource trait, which has two implementations: the Jikan REST client
// for live MyAnimeList data, and an embedded static dataset for offline use.

pub mod embedded;
pub mod jikan;
pub mod rate_limiter;
pub mod records;

use std::collections::HashMap;

use async_trait::async_trait;

pub use records::{CatalogRecord, PaginationInfo};

/// Lowercased genre name -> catalog genre id.
pub type GenreMap = HashMap<String, u64>;

/// One page of genre-filtered results.
#[derive(Debug, Clone, Default)]
pub struct GenreResults {
    pub records: Vec<CatalogRecord>,
    /// Missing when the source didn't report pagination (or the call failed)
    pub pagination: Option<PaginationInfo>,
}

/// Read-only access to an anime catalog.
///
/// Every method fails soft: a transport error, bad status or unparseable
/// body is logged by the implementation and surfaces here as "no data".
/// Callers treat a failed call exactly like an empty result.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Free-text title search, best match first.
    async fn search_by_title(&self, query: &str) -> Vec<CatalogRecord>;

    /// Full record (including themes, studios and producers) for one id.
    async fn get_detail_by_id(&self, id: u64) -> Option<CatalogRecord>;

    /// The catalog's own "people who liked this also liked" list.
    async fn get_recommendations(&self, id: u64) -> Vec<CatalogRecord>;

    async fn get_genre_map(&self) -> GenreMap;

    /// Records in a genre, highest score first, one page at a time.
    async fn search_by_genre(&self, genre_id: u64, page: u32, limit: u32) -> GenreResults;

    /// Source name for logging and display.
    fn name(&self) -> &'static str;
}
