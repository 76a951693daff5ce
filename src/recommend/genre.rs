// Genre browsing: top-scored titles in a genre, one page at a time.
//
// Simpler than the similar-title pipeline: no scoring and no origin tiers.
// Results come back from the catalog already sorted by score; we normalize,
// drop duplicate ids (first one wins) and keep the first `n`.
//
// The genre name -> id map is fetched once per browser and reused.
// Pagination state is returned to the caller as a PageState value rather
// than kept here, so the caller decides what "next page" means.

use std::collections::HashSet;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::RecommendError;
use crate::catalog::{CatalogSource, GenreMap, PaginationInfo};
use crate::normalize::{self, Candidate};

/// Genres offered as quick picks when present in the catalog.
pub const FEATURED_GENRES: [&str; 12] = [
    "Action",
    "Adventure",
    "Comedy",
    "Drama",
    "Fantasy",
    "Horror",
    "Mystery",
    "Romance",
    "Sci-Fi",
    "Slice of Life",
    "Sports",
    "Supernatural",
];

/// Default number of titles per genre request.
pub const DEFAULT_GENRE_COUNT: usize = 3;

/// Jikan rejects page sizes above 25.
const MAX_PAGE_LIMIT: u32 = 25;

/// Where a genre listing is in its pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    pub current_page: u32,
    pub last_page: u32,
    pub has_next_page: bool,
}

impl PageState {
    /// Derive page state from catalog metadata, falling back to "this is the
    /// only page" when the catalog didn't say.
    pub fn from_pagination(info: Option<&PaginationInfo>, requested_page: u32) -> Self {
        let current_page = info
            .and_then(|p| p.current_page)
            .map(saturating_u32)
            .unwrap_or(requested_page);
        let last_page = info
            .and_then(|p| p.last_visible_page)
            .map(saturating_u32)
            .unwrap_or(current_page)
            .max(current_page);
        let has_next_page = info.is_some_and(|p| p.has_next_page);

        Self {
            current_page,
            last_page,
            has_next_page,
        }
    }

    /// The page to request next, if there is one.
    pub fn next(&self) -> Option<u32> {
        self.has_next_page
            .then(|| self.current_page.checked_add(1))
            .flatten()
    }

    /// The page before this one, if there is one.
    pub fn previous(&self) -> Option<u32> {
        (self.current_page > 1).then(|| self.current_page - 1)
    }
}

/// One page of genre recommendations.
#[derive(Debug, Clone)]
pub struct GenrePage {
    /// Genre name as the user typed it
    pub genre: String,
    pub items: Vec<Candidate>,
    pub page: PageState,
}

/// Genre lookups against a catalog, with the genre map cached.
pub struct GenreBrowser<'a> {
    catalog: &'a dyn CatalogSource,
    genre_map: OnceCell<GenreMap>,
}

impl<'a> GenreBrowser<'a> {
    pub fn new(catalog: &'a dyn CatalogSource) -> Self {
        Self {
            catalog,
            genre_map: OnceCell::new(),
        }
    }

    /// The genre map, fetched on first use.
    pub async fn genre_map(&self) -> &GenreMap {
        self.genre_map
            .get_or_init(|| async {
                let map = self.catalog.get_genre_map().await;
                info!(genres = map.len(), source = self.catalog.name(), "Loaded genre map");
                map
            })
            .await
    }

    /// All known genre names (lowercased), sorted.
    pub async fn available_genres(&self) -> Vec<String> {
        let mut names: Vec<String> = self.genre_map().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// The featured genres this catalog actually knows about.
    pub async fn featured_genres(&self) -> Vec<&'static str> {
        let map = self.genre_map().await;
        FEATURED_GENRES
            .into_iter()
            .filter(|g| map.contains_key(&g.to_lowercase()))
            .collect()
    }

    /// Up to `n` top-scored titles in `genre_name`, from page `page`.
    pub async fn recommend_by_genre(
        &self,
        genre_name: &str,
        n: usize,
        page: u32,
    ) -> Result<GenrePage, RecommendError> {
        if n == 0 {
            return Err(RecommendError::InvalidInput(
                "the number of recommendations must be positive".to_string(),
            ));
        }
        let genre_name = genre_name.trim();
        let genre_id = *self
            .genre_map()
            .await
            .get(&genre_name.to_lowercase())
            .ok_or_else(|| RecommendError::UnknownGenre(genre_name.to_string()))?;

        let page = page.max(1);
        // Over-fetch so duplicates and id-less records don't leave us short
        let limit = page_limit(n);
        debug!(genre_id = genre_id, page = page, limit = limit, "Fetching genre page");

        let results = self.catalog.search_by_genre(genre_id, page, limit).await;

        let mut seen = HashSet::new();
        let items: Vec<Candidate> = results
            .records
            .iter()
            .filter_map(|r| normalize::normalize(Some(r)))
            .filter(|c| seen.insert(c.id))
            .take(n)
            .collect();

        if items.is_empty() {
            return Err(RecommendError::Empty(genre_name.to_string()));
        }

        Ok(GenrePage {
            genre: genre_name.to_string(),
            items,
            page: PageState::from_pagination(results.pagination.as_ref(), page),
        })
    }
}

/// Page size to request for `n` wanted titles: `n * 2 + 5`, capped.
pub fn page_limit(n: usize) -> u32 {
    saturating_u32(u64::try_from(n).unwrap_or(u64::MAX))
        .saturating_mul(2)
        .saturating_add(5)
        .min(MAX_PAGE_LIMIT)
}

fn saturating_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
