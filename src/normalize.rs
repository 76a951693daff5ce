// Record normalization: raw catalog records -> canonical candidates.
//
// Everything downstream (dedup, scoring, ranking, display) works on
// Candidate, never on CatalogRecord. This is the one place where missing
// fields get their placeholders and where loosely typed name lists are
// flattened into plain strings.

use serde::Serialize;
use serde_json::Value;

use crate::catalog::CatalogRecord;

/// Shown when a record has no title.
pub const NO_TITLE: &str = "N/A";
/// Shown when a record has no synopsis.
pub const NO_SYNOPSIS: &str = "No synopsis available.";

/// Which channel a candidate arrived through.
///
/// Direct recommendations always outrank supplementary search hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// The catalog's own recommendation list for the favorite
    Direct,
    /// A supplementary keyword search (theme/studio + genre)
    Search,
}

/// A recommendation under consideration, in canonical shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub id: u64,
    pub title: String,
    pub synopsis: String,
    pub image_url: Option<String>,
    /// Display case preserved; comparisons fold case
    pub genres: Vec<String>,
    pub themes: Vec<String>,
    pub studios: Vec<String>,
    pub producers: Vec<String>,
    /// Catalog popularity/quality score, if the catalog had one
    pub external_score: Option<f64>,
    pub origin: Origin,
    /// Weighted overlap with the favorite; set by the aggregator
    pub local_score: u32,
}

impl Candidate {
    pub fn is_direct(&self) -> bool {
        self.origin == Origin::Direct
    }

    /// External score for ranking purposes (missing counts as 0).
    pub fn ranking_score(&self) -> f64 {
        self.external_score.unwrap_or(0.0)
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// MyAnimeList page for this title.
    pub fn mal_url(&self) -> String {
        format!("https://myanimelist.net/anime/{}", self.id)
    }
}

/// Normalize a raw record into a Candidate.
///
/// Returns `None` for a missing record or one without an id (it can't be
/// deduplicated, so it can't be recommended). Never fails otherwise: any
/// missing optional field resolves to a placeholder, `None`, or an empty
/// list. New candidates start as `Origin::Search` with a local score of 0.
pub fn normalize(record: Option<&CatalogRecord>) -> Option<Candidate> {
    let record = record?;
    let id = record.mal_id?;

    Some(Candidate {
        id,
        title: record
            .title
            .clone()
            .unwrap_or_else(|| NO_TITLE.to_string()),
        synopsis: record
            .synopsis
            .clone()
            .unwrap_or_else(|| NO_SYNOPSIS.to_string()),
        image_url: image_url(record.images.as_ref()),
        genres: entry_names(&record.genres),
        themes: entry_names(&record.themes),
        studios: entry_names(&record.studios),
        producers: entry_names(&record.producers),
        external_score: record.score,
        origin: Origin::Search,
        local_score: 0,
    })
}

/// Normalize a batch, dropping anything without an id or matching `exclude_id`.
pub fn normalize_all(
    records: &[CatalogRecord],
    exclude_id: Option<u64>,
    origin: Origin,
) -> Vec<Candidate> {
    records
        .iter()
        .filter_map(|r| normalize(Some(r)))
        .filter(|c| Some(c.id) != exclude_id)
        .map(|c| c.with_origin(origin))
        .collect()
}

/// Pull `name` out of every element that is an object with a string name.
fn entry_names(entries: &[Value]) -> Vec<String> {
    entries
        .iter()
        .filter_map(|entry| entry.get("name").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

/// Prefer the large JPG, fall back to the regular one. Blank URLs count as missing.
fn image_url(images: Option<&Value>) -> Option<String> {
    let jpg = images?.get("jpg")?;
    ["large_image_url", "image_url"]
        .iter()
        .filter_map(|key| jpg.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|url| !url.is_empty())
        .map(str::to_string)
}
