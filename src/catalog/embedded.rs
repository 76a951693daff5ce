// Embedded static catalog for offline use.
//
// A small hand-picked dataset ships inside the binary (data/anime.json, in
// the same shape Jikan returns), so every command works without a network.
// Title search is a case-insensitive substring match with a keyword
// fallback, and "direct recommendations" come from the TF-IDF similarity
// index built over the synopses when the catalog is loaded.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use super::records::CatalogRecord;
use super::{CatalogSource, GenreMap, GenreResults, PaginationInfo};
use crate::normalize::NO_TITLE;
use crate::similarity::tfidf::{SimilarityIndex, TfIdfParams};

const EMBEDDED_DATASET: &str = include_str!("../../data/anime.json");

/// Same cap as a Jikan title search.
const SEARCH_LIMIT: usize = 5;

/// How many neighbours count as the catalog's own recommendations.
const RECOMMENDATION_LIMIT: usize = 10;

/// In-memory catalog with a precomputed similarity index.
pub struct StaticCatalog {
    records: Vec<CatalogRecord>,
    index: SimilarityIndex,
}

impl StaticCatalog {
    /// Load the dataset compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_DATASET).context("Embedded dataset is invalid")
    }

    /// Load a dataset from a JSON array of Jikan-shaped anime records.
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<CatalogRecord> =
            serde_json::from_str(json).context("Failed to parse anime dataset")?;
        Self::from_records(records)
    }

    /// Build the catalog and its similarity index. Records without an id
    /// are dropped since nothing could ever look them up.
    pub fn from_records(records: Vec<CatalogRecord>) -> Result<Self> {
        let total = records.len();
        let records: Vec<CatalogRecord> =
            records.into_iter().filter(|r| r.mal_id.is_some()).collect();
        if records.len() < total {
            warn!(
                dropped = total - records.len(),
                "Skipped dataset records without an id"
            );
        }

        let items: Vec<(String, String)> = records
            .iter()
            .map(|r| {
                (
                    r.title.clone().unwrap_or_else(|| NO_TITLE.to_string()),
                    r.synopsis.clone().unwrap_or_default(),
                )
            })
            .collect();
        let index = SimilarityIndex::build(&items, TfIdfParams::default())
            .context("Failed to build similarity index")?;

        info!(records = records.len(), "Loaded static catalog");
        Ok(Self { records, index })
    }

    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    /// The synopsis similarity index, one row per record.
    pub fn similarity(&self) -> &SimilarityIndex {
        &self.index
    }

    fn position_of(&self, id: u64) -> Option<usize> {
        self.records.iter().position(|r| r.mal_id == Some(id))
    }

    /// Title substring matches first, then records whose title or
    /// genre/theme/studio names contain every word of the query.
    fn search(&self, query: &str) -> Vec<CatalogRecord> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        let words: Vec<&str> = query.split_whitespace().collect();

        let title_hits = self.records.iter().filter(|r| {
            r.title
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains(&query))
        });
        let keyword_hits = self.records.iter().filter(|r| {
            let already = r
                .title
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains(&query));
            let haystack = keyword_haystack(r);
            !already && words.iter().all(|w| haystack.contains(w))
        });

        title_hits
            .chain(keyword_hits)
            .take(SEARCH_LIMIT)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn search_by_title(&self, query: &str) -> Vec<CatalogRecord> {
        self.search(query)
    }

    async fn get_detail_by_id(&self, id: u64) -> Option<CatalogRecord> {
        self.position_of(id).map(|i| self.records[i].clone())
    }

    async fn get_recommendations(&self, id: u64) -> Vec<CatalogRecord> {
        let Some(position) = self.position_of(id) else {
            return Vec::new();
        };
        self.index
            .neighbours(position, RECOMMENDATION_LIMIT)
            .into_iter()
            // Zero similarity means no shared vocabulary at all
            .filter(|n| n.score > 0.0)
            .map(|n| self.records[n.index].clone())
            .collect()
    }

    async fn get_genre_map(&self) -> GenreMap {
        let mut map = GenreMap::new();
        for entry in self.records.iter().flat_map(|r| r.genres.iter()) {
            let name = entry.get("name").and_then(Value::as_str);
            let id = entry.get("mal_id").and_then(Value::as_u64);
            if let (Some(name), Some(id)) = (name, id) {
                map.insert(name.to_lowercase(), id);
            }
        }
        map
    }

    async fn search_by_genre(&self, genre_id: u64, page: u32, limit: u32) -> GenreResults {
        let mut matching: Vec<&CatalogRecord> = self
            .records
            .iter()
            .filter(|r| {
                r.genres
                    .iter()
                    .any(|g| g.get("mal_id").and_then(Value::as_u64) == Some(genre_id))
            })
            .collect();
        matching.sort_by(|a, b| {
            b.score
                .unwrap_or(0.0)
                .total_cmp(&a.score.unwrap_or(0.0))
        });

        let limit = limit.max(1) as usize;
        let page = page.max(1);
        let last_page = matching.len().div_ceil(limit).max(1);
        let start = (page as usize - 1) * limit;

        let records = matching
            .into_iter()
            .skip(start)
            .take(limit)
            .cloned()
            .collect();

        GenreResults {
            records,
            pagination: Some(PaginationInfo {
                last_visible_page: Some(last_page as u64),
                has_next_page: (page as usize) < last_page,
                current_page: Some(page as u64),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Lowercased title plus every genre/theme/studio name, space separated.
fn keyword_haystack(record: &CatalogRecord) -> String {
    let names = record
        .genres
        .iter()
        .chain(&record.themes)
        .chain(&record.studios)
        .filter_map(|e| e.get("name").and_then(Value::as_str));

    let mut haystack = record.title.clone().unwrap_or_default();
    for name in names {
        haystack.push(' ');
        haystack.push_str(name);
    }
    haystack.to_lowercase()
}
