// Hybrid "recommend similar" pipeline.
//
// Given a favorite title, this:
// 1. Resolves the title to a full catalog record (the favorite profile)
// 2. Fetches the catalog's direct recommendations for it
// 3. If those are too few, runs up to two supplementary keyword searches
//    built from the favorite's first theme/studio and first genre
// 4. Merges everything by id, direct entries winning over search hits
// 5. Scores each survivor by weighted overlap with the favorite
// 6. Ranks by (direct first, external score, local score, insertion order)
// 7. Truncates to the requested count
//
// Catalog calls are issued one at a time, in that order.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::{debug, info};

use super::scoring::{self, FavoriteProfile, OverlapWeights};
use super::RecommendError;
use crate::catalog::CatalogSource;
use crate::normalize::{self, Candidate, Origin};

/// Default number of recommendations.
pub const DEFAULT_TOP_N: usize = 5;

/// Tuning knobs for the hybrid pipeline.
#[derive(Debug, Clone)]
pub struct SimilarSettings {
    /// The second supplementary query only runs while direct + first-query
    /// results number fewer than `second_query_factor * top_n`.
    pub second_query_factor: f64,
    pub weights: OverlapWeights,
}

impl Default for SimilarSettings {
    fn default() -> Self {
        Self {
            second_query_factor: 1.5,
            weights: OverlapWeights::default(),
        }
    }
}

/// Recommend up to `top_n` titles similar to `favorite_title`.
pub async fn recommend_similar(
    catalog: &dyn CatalogSource,
    favorite_title: &str,
    top_n: usize,
    settings: &SimilarSettings,
) -> Result<Vec<Candidate>, RecommendError> {
    let favorite_title = favorite_title.trim();
    if favorite_title.is_empty() {
        return Err(RecommendError::InvalidInput(
            "please enter an anime title".to_string(),
        ));
    }
    if top_n == 0 {
        return Err(RecommendError::InvalidInput(
            "the number of recommendations must be positive".to_string(),
        ));
    }

    let favorite = resolve_favorite(catalog, favorite_title).await?;
    info!(id = favorite.id, title = %favorite.title, "Resolved favorite");

    let direct = fetch_direct(catalog, &favorite).await;
    info!(count = direct.len(), "Direct recommendations");

    let supplementary = if direct.len() < top_n {
        fetch_supplementary(catalog, &favorite, direct.len(), top_n, settings).await
    } else {
        Vec::new()
    };

    let mut pool = CandidatePool::default();
    for candidate in direct.into_iter().chain(supplementary) {
        if candidate.id != favorite.id {
            pool.insert(candidate);
        }
    }

    if pool.is_empty() {
        return Err(RecommendError::Empty(favorite_title.to_string()));
    }
    debug!(count = pool.len(), "Merged candidates");

    let profile = FavoriteProfile::from_candidate(&favorite);
    let mut candidates = pool.into_ordered();
    for candidate in &mut candidates {
        candidate.local_score = profile.local_score(candidate, &settings.weights);
    }

    let mut ranked = scoring::rank(candidates);
    ranked.truncate(top_n);

    info!(count = ranked.len(), "Ranked recommendations");
    Ok(ranked)
}

/// Search for the title, take the first hit, and fetch its full record.
pub async fn resolve_favorite(
    catalog: &dyn CatalogSource,
    title: &str,
) -> Result<Candidate, RecommendError> {
    let hits = catalog.search_by_title(title).await;
    let first = hits
        .first()
        .ok_or_else(|| RecommendError::NotFound(title.to_string()))?;

    let display = first.title.clone().unwrap_or_else(|| title.to_string());
    let id = first
        .mal_id
        .ok_or_else(|| RecommendError::DetailUnavailable(display.clone()))?;

    let detail = catalog.get_detail_by_id(id).await;
    normalize::normalize(detail.as_ref()).ok_or(RecommendError::DetailUnavailable(display))
}

async fn fetch_direct(catalog: &dyn CatalogSource, favorite: &Candidate) -> Vec<Candidate> {
    let records = catalog.get_recommendations(favorite.id).await;
    normalize::normalize_all(&records, Some(favorite.id), Origin::Direct)
}

/// Run the theme+genre query, then (if still short) the studio+genre query.
async fn fetch_supplementary(
    catalog: &dyn CatalogSource,
    favorite: &Candidate,
    direct_count: usize,
    top_n: usize,
    settings: &SimilarSettings,
) -> Vec<Candidate> {
    let mut found = Vec::new();

    if let Some(query) = theme_query(favorite) {
        debug!(query = %query, "Supplementary query A");
        let records = catalog.search_by_title(&query).await;
        found.extend(normalize::normalize_all(
            &records,
            Some(favorite.id),
            Origin::Search,
        ));
    }

    let threshold = settings.second_query_factor * top_n as f64;
    if ((direct_count + found.len()) as f64) < threshold {
        if let Some(query) = studio_query(favorite) {
            debug!(query = %query, "Supplementary query B");
            let records = catalog.search_by_title(&query).await;
            found.extend(normalize::normalize_all(
                &records,
                Some(favorite.id),
                Origin::Search,
            ));
        }
    }

    info!(count = found.len(), "Supplementary candidates");
    found
}

/// "{first theme} {first genre}", if the favorite has both.
pub fn theme_query(favorite: &Candidate) -> Option<String> {
    let theme = favorite.themes.first()?;
    let genre = favorite.genres.first()?;
    Some(format!("{theme} {genre}"))
}

/// "{first studio} {first genre}", if the favorite has both.
pub fn studio_query(favorite: &Candidate) -> Option<String> {
    let studio = favorite.studios.first()?;
    let genre = favorite.genres.first()?;
    Some(format!("{studio} {genre}"))
}

/// Candidates keyed by id, remembering the order ids were first seen.
///
/// A later insert replaces an existing entry only when it is direct and the
/// existing one isn't. The replaced entry keeps its original position.
#[derive(Debug, Default)]
pub struct CandidatePool {
    order: Vec<u64>,
    entries: HashMap<u64, Candidate>,
}

impl CandidatePool {
    pub fn insert(&mut self, candidate: Candidate) {
        match self.entries.entry(candidate.id) {
            Entry::Vacant(slot) => {
                self.order.push(candidate.id);
                slot.insert(candidate);
            }
            Entry::Occupied(mut slot) => {
                if candidate.is_direct() && !slot.get().is_direct() {
                    slot.insert(candidate);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Drain into a list in first-insertion order.
    pub fn into_ordered(mut self) -> Vec<Candidate> {
        self.order
            .iter()
            .filter_map(|id| self.entries.remove(id))
            .collect()
    }
}
