// Composition tests: the recommendation pipelines end to end.
//
// These run the similar-title and genre pipelines against an in-memory
// catalog that records every call, so we can check both the results and
// which lookups were (or weren't) made. No network access.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use anirec::catalog::embedded::StaticCatalog;
use anirec::catalog::{CatalogRecord, CatalogSource, GenreMap, GenreResults, PaginationInfo};
use anirec::normalize::Origin;
use anirec::recommend::genre::GenreBrowser;
use anirec::recommend::similar::{recommend_similar, SimilarSettings};
use anirec::recommend::RecommendError;

// ============================================================
// Fake catalog
// ============================================================

#[derive(Default)]
struct FakeCatalog {
    searches: HashMap<String, Vec<CatalogRecord>>,
    details: HashMap<u64, CatalogRecord>,
    recommendations: HashMap<u64, Vec<CatalogRecord>>,
    genres: GenreMap,
    genre_pages: HashMap<(u64, u32), GenreResults>,
    calls: Mutex<Vec<String>>,
}

impl FakeCatalog {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn search_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("search:"))
            .collect()
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn search_by_title(&self, query: &str) -> Vec<CatalogRecord> {
        self.record(format!("search:{query}"));
        self.searches.get(query).cloned().unwrap_or_default()
    }

    async fn get_detail_by_id(&self, id: u64) -> Option<CatalogRecord> {
        self.record(format!("detail:{id}"));
        self.details.get(&id).cloned()
    }

    async fn get_recommendations(&self, id: u64) -> Vec<CatalogRecord> {
        self.record(format!("recommendations:{id}"));
        self.recommendations.get(&id).cloned().unwrap_or_default()
    }

    async fn get_genre_map(&self) -> GenreMap {
        self.record("genres".to_string());
        self.genres.clone()
    }

    async fn search_by_genre(&self, genre_id: u64, page: u32, limit: u32) -> GenreResults {
        self.record(format!("genre:{genre_id}:{page}:{limit}"));
        self.genre_pages
            .get(&(genre_id, page))
            .cloned()
            .unwrap_or_default()
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

fn anime(
    id: u64,
    title: &str,
    score: Option<f64>,
    genres: &[&str],
    themes: &[&str],
    studios: &[&str],
) -> CatalogRecord {
    let named = |names: &[&str]| -> Vec<serde_json::Value> {
        names.iter().map(|n| json!({ "name": n })).collect()
    };
    serde_json::from_value(json!({
        "mal_id": id,
        "title": title,
        "score": score,
        "genres": named(genres),
        "themes": named(themes),
        "studios": named(studios),
    }))
    .unwrap()
}

const FAV_ID: u64 = 100;

/// Favorite: genres {Action, Fantasy}, themes {Isekai}, studios {White Fox}.
/// Query A is "Isekai Action", query B is "White Fox Action".
fn catalog_with_favorite() -> FakeCatalog {
    let fav = anime(
        FAV_ID,
        "Favorite Show",
        Some(8.0),
        &["Action", "Fantasy"],
        &["Isekai"],
        &["White Fox"],
    );
    let mut catalog = FakeCatalog::default();
    catalog
        .searches
        .insert("Favorite Show".to_string(), vec![fav.clone()]);
    catalog.details.insert(FAV_ID, fav);
    catalog
}

fn ids(list: &[anirec::normalize::Candidate]) -> Vec<u64> {
    list.iter().map(|c| c.id).collect()
}

// ============================================================
// recommend_similar: resolution failures
// ============================================================

#[tokio::test]
async fn empty_title_search_is_not_found() {
    let catalog = FakeCatalog::default();
    let result = recommend_similar(&catalog, "Nothing Matches", 5, &SimilarSettings::default()).await;
    assert_eq!(
        result,
        Err(RecommendError::NotFound("Nothing Matches".to_string()))
    );
    // Stops right after the search
    assert_eq!(catalog.calls(), vec!["search:Nothing Matches"]);
}

#[tokio::test]
async fn failed_detail_fetch_is_detail_unavailable() {
    let mut catalog = FakeCatalog::default();
    catalog.searches.insert(
        "Ghost".to_string(),
        vec![anime(7, "Ghost in the Shell", None, &[], &[], &[])],
    );
    let result = recommend_similar(&catalog, "Ghost", 5, &SimilarSettings::default()).await;
    assert_eq!(
        result,
        Err(RecommendError::DetailUnavailable(
            "Ghost in the Shell".to_string()
        ))
    );
}

#[tokio::test]
async fn search_hit_without_id_is_detail_unavailable() {
    let mut catalog = FakeCatalog::default();
    let no_id: CatalogRecord = serde_json::from_value(json!({"title": "Mystery"})).unwrap();
    catalog.searches.insert("Mystery".to_string(), vec![no_id]);
    let result = recommend_similar(&catalog, "Mystery", 5, &SimilarSettings::default()).await;
    assert!(matches!(result, Err(RecommendError::DetailUnavailable(_))));
    assert!(!catalog.calls().iter().any(|c| c.starts_with("detail:")));
}

#[tokio::test]
async fn blank_title_is_invalid_input() {
    let catalog = FakeCatalog::default();
    let result = recommend_similar(&catalog, "   ", 5, &SimilarSettings::default()).await;
    assert!(matches!(result, Err(RecommendError::InvalidInput(_))));
    assert!(catalog.calls().is_empty());
}

#[tokio::test]
async fn nothing_to_recommend_is_empty() {
    let catalog = catalog_with_favorite();
    let result = recommend_similar(&catalog, "Favorite Show", 5, &SimilarSettings::default()).await;
    assert_eq!(
        result,
        Err(RecommendError::Empty("Favorite Show".to_string()))
    );
}

// ============================================================
// recommend_similar: supplementary searches
// ============================================================

#[tokio::test]
async fn enough_direct_results_skip_supplementary_search() {
    let mut catalog = catalog_with_favorite();
    catalog.recommendations.insert(
        FAV_ID,
        (1..=5)
            .map(|i| anime(i, &format!("Direct {i}"), Some(7.0), &[], &[], &[]))
            .collect(),
    );

    let result = recommend_similar(&catalog, "Favorite Show", 5, &SimilarSettings::default())
        .await
        .unwrap();
    assert_eq!(result.len(), 5);
    assert_eq!(catalog.search_calls(), vec!["search:Favorite Show"]);
}

#[tokio::test]
async fn short_direct_results_trigger_both_queries() {
    let mut catalog = catalog_with_favorite();
    catalog
        .recommendations
        .insert(FAV_ID, vec![anime(1, "Direct", Some(7.0), &[], &[], &[])]);
    catalog.searches.insert(
        "Isekai Action".to_string(),
        vec![anime(2, "Isekai Hit", Some(7.5), &["Action"], &["Isekai"], &[])],
    );
    catalog.searches.insert(
        "White Fox Action".to_string(),
        vec![anime(3, "Studio Hit", Some(7.2), &["Action"], &[], &["White Fox"])],
    );

    let result = recommend_similar(&catalog, "Favorite Show", 5, &SimilarSettings::default())
        .await
        .unwrap();

    assert_eq!(
        catalog.search_calls(),
        vec![
            "search:Favorite Show",
            "search:Isekai Action",
            "search:White Fox Action"
        ]
    );
    assert_eq!(ids(&result), vec![1, 2, 3]);
    assert_eq!(result[0].origin, Origin::Direct);
    assert_eq!(result[1].origin, Origin::Search);
}

#[tokio::test]
async fn second_query_skipped_when_first_is_plenty() {
    let mut catalog = catalog_with_favorite();
    // 1 direct + 7 from query A = 8 >= 1.5 * 5
    catalog
        .recommendations
        .insert(FAV_ID, vec![anime(1, "Direct", None, &[], &[], &[])]);
    catalog.searches.insert(
        "Isekai Action".to_string(),
        (10..17)
            .map(|i| anime(i, &format!("Hit {i}"), None, &[], &[], &[]))
            .collect(),
    );

    recommend_similar(&catalog, "Favorite Show", 5, &SimilarSettings::default())
        .await
        .unwrap();
    assert!(!catalog
        .search_calls()
        .contains(&"search:White Fox Action".to_string()));
}

#[tokio::test]
async fn second_query_factor_is_configurable() {
    let mut catalog = catalog_with_favorite();
    catalog
        .recommendations
        .insert(FAV_ID, vec![anime(1, "Direct", None, &[], &[], &[])]);

    let settings = SimilarSettings {
        second_query_factor: 0.0,
        ..SimilarSettings::default()
    };
    recommend_similar(&catalog, "Favorite Show", 5, &settings)
        .await
        .unwrap();
    assert_eq!(
        catalog.search_calls(),
        vec!["search:Favorite Show", "search:Isekai Action"]
    );
}

#[tokio::test]
async fn queries_need_a_genre() {
    let fav = anime(FAV_ID, "Genreless", None, &[], &["Isekai"], &["White Fox"]);
    let mut catalog = FakeCatalog::default();
    catalog
        .searches
        .insert("Genreless".to_string(), vec![fav.clone()]);
    catalog.details.insert(FAV_ID, fav);
    catalog
        .recommendations
        .insert(FAV_ID, vec![anime(1, "Direct", None, &[], &[], &[])]);

    recommend_similar(&catalog, "Genreless", 5, &SimilarSettings::default())
        .await
        .unwrap();
    assert_eq!(catalog.search_calls(), vec!["search:Genreless"]);
}

#[tokio::test]
async fn studio_query_runs_without_a_theme() {
    let fav = anime(FAV_ID, "Themeless", None, &["Action"], &[], &["White Fox"]);
    let mut catalog = FakeCatalog::default();
    catalog
        .searches
        .insert("Themeless".to_string(), vec![fav.clone()]);
    catalog.details.insert(FAV_ID, fav);
    catalog.searches.insert(
        "White Fox Action".to_string(),
        vec![anime(2, "Studio Hit", Some(7.0), &["Action"], &[], &["White Fox"])],
    );

    let result = recommend_similar(&catalog, "Themeless", 5, &SimilarSettings::default())
        .await
        .unwrap();
    assert_eq!(
        catalog.search_calls(),
        vec!["search:Themeless", "search:White Fox Action"]
    );
    assert_eq!(ids(&result), vec![2]);
    assert_eq!(result[0].local_score, 2 + 3);
}

// ============================================================
// recommend_similar: merge, exclusion, ranking
// ============================================================

#[tokio::test]
async fn favorite_never_recommended_to_itself() {
    let mut catalog = catalog_with_favorite();
    let fav_again = anime(FAV_ID, "Favorite Show", Some(9.9), &["Action"], &[], &[]);
    catalog.recommendations.insert(
        FAV_ID,
        vec![fav_again.clone(), anime(1, "Other", None, &[], &[], &[])],
    );
    catalog
        .searches
        .insert("Isekai Action".to_string(), vec![fav_again]);

    let result = recommend_similar(&catalog, "Favorite Show", 5, &SimilarSettings::default())
        .await
        .unwrap();
    assert!(!ids(&result).contains(&FAV_ID));
}

#[tokio::test]
async fn duplicate_across_channels_is_direct() {
    let mut catalog = catalog_with_favorite();
    catalog
        .recommendations
        .insert(FAV_ID, vec![anime(1, "Shared", Some(7.0), &[], &[], &[])]);
    catalog.searches.insert(
        "Isekai Action".to_string(),
        vec![
            anime(1, "Shared", Some(7.0), &[], &[], &[]),
            anime(2, "Search Only", Some(9.0), &[], &[], &[]),
            anime(2, "Search Only", Some(9.0), &[], &[], &[]),
        ],
    );

    let result = recommend_similar(&catalog, "Favorite Show", 5, &SimilarSettings::default())
        .await
        .unwrap();

    assert_eq!(ids(&result), vec![1, 2]);
    assert_eq!(result[0].origin, Origin::Direct);
}

#[tokio::test]
async fn ranking_uses_tier_then_external_then_local_score() {
    let mut catalog = catalog_with_favorite();
    catalog.recommendations.insert(
        FAV_ID,
        vec![
            // Same external score; the one sharing the studio wins on local score
            anime(1, "Direct Plain", Some(7.0), &[], &[], &[]),
            anime(2, "Direct Studio", Some(7.0), &[], &[], &["White Fox"]),
            anime(3, "Direct Popular", Some(8.0), &[], &[], &[]),
        ],
    );
    catalog.searches.insert(
        "Isekai Action".to_string(),
        vec![anime(
            4,
            "Search Perfect",
            Some(9.5),
            &["Action", "Fantasy"],
            &["Isekai"],
            &["White Fox"],
        )],
    );

    let result = recommend_similar(&catalog, "Favorite Show", 5, &SimilarSettings::default())
        .await
        .unwrap();

    assert_eq!(ids(&result), vec![3, 2, 1, 4]);
    assert_eq!(result[1].local_score, 3);
    assert_eq!(result[3].local_score, 2 * 2 + 1 + 3);
}

#[tokio::test]
async fn full_ties_keep_first_seen_order() {
    let mut catalog = catalog_with_favorite();
    catalog.recommendations.insert(
        FAV_ID,
        vec![
            anime(30, "C", Some(7.0), &[], &[], &[]),
            anime(10, "A", Some(7.0), &[], &[], &[]),
            anime(20, "B", Some(7.0), &[], &[], &[]),
        ],
    );

    let result = recommend_similar(&catalog, "Favorite Show", 5, &SimilarSettings::default())
        .await
        .unwrap();
    assert_eq!(ids(&result), vec![30, 10, 20]);
}

#[tokio::test]
async fn results_truncated_to_top_n_with_unique_ids() {
    let mut catalog = catalog_with_favorite();
    catalog.recommendations.insert(
        FAV_ID,
        (1..=12)
            .map(|i| anime(i % 8 + 1, "Dup", Some(i as f64 / 2.0), &[], &[], &[]))
            .collect(),
    );

    let result = recommend_similar(&catalog, "Favorite Show", 6, &SimilarSettings::default())
        .await
        .unwrap();
    assert_eq!(result.len(), 6);
    let mut unique = ids(&result);
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 6);
}

// ============================================================
// Genre browsing
// ============================================================

fn catalog_with_genres() -> FakeCatalog {
    let mut catalog = FakeCatalog::default();
    catalog.genres.insert("action".to_string(), 1);
    catalog.genres.insert("slice of life".to_string(), 36);
    catalog.genre_pages.insert(
        (1, 1),
        GenreResults {
            records: vec![
                anime(1, "First", Some(9.0), &["Action"], &[], &[]),
                anime(1, "First Again", Some(9.0), &["Action"], &[], &[]),
                anime(2, "Second", Some(8.5), &["Action"], &[], &[]),
                anime(3, "Third", Some(8.0), &["Action"], &[], &[]),
                anime(4, "Fourth", Some(7.5), &["Action"], &[], &[]),
            ],
            pagination: Some(PaginationInfo {
                last_visible_page: Some(12),
                has_next_page: true,
                current_page: Some(1),
            }),
        },
    );
    catalog
}

#[tokio::test]
async fn unknown_genre_never_fetches_list() {
    let catalog = catalog_with_genres();
    let browser = GenreBrowser::new(&catalog);
    let result = browser.recommend_by_genre("Underwater Basket Weaving", 3, 1).await;
    assert!(matches!(result, Err(RecommendError::UnknownGenre(_))));
    assert!(!catalog.calls().iter().any(|c| c.starts_with("genre:")));
}

#[tokio::test]
async fn genre_lookup_is_case_insensitive_and_dedups() {
    let catalog = catalog_with_genres();
    let browser = GenreBrowser::new(&catalog);
    let page = browser.recommend_by_genre("ACTION", 3, 1).await.unwrap();

    assert_eq!(ids(&page.items), vec![1, 2, 3]);
    assert_eq!(page.items[0].title, "First");
    assert_eq!(page.page.current_page, 1);
    assert_eq!(page.page.last_page, 12);
    assert_eq!(page.page.next(), Some(2));
    // Over-fetches n * 2 + 5
    assert!(catalog.calls().contains(&"genre:1:1:11".to_string()));
}

#[tokio::test]
async fn genre_map_fetched_once() {
    let catalog = catalog_with_genres();
    let browser = GenreBrowser::new(&catalog);
    browser.recommend_by_genre("action", 2, 1).await.unwrap();
    browser.recommend_by_genre("Action", 2, 1).await.unwrap();
    let _ = browser.featured_genres().await;

    let genre_map_calls = catalog.calls().iter().filter(|c| *c == "genres").count();
    assert_eq!(genre_map_calls, 1);
}

#[tokio::test]
async fn genre_with_no_results_is_empty() {
    let catalog = catalog_with_genres();
    let browser = GenreBrowser::new(&catalog);
    let result = browser.recommend_by_genre("Slice of Life", 3, 1).await;
    assert_eq!(
        result.unwrap_err(),
        RecommendError::Empty("Slice of Life".to_string())
    );
}

#[tokio::test]
async fn featured_genres_filtered_to_catalog() {
    let catalog = catalog_with_genres();
    let browser = GenreBrowser::new(&catalog);
    assert_eq!(
        browser.featured_genres().await,
        vec!["Action", "Slice of Life"]
    );
}

// ============================================================
// Static catalog end to end
// ============================================================

#[tokio::test]
async fn static_catalog_similar_pipeline() {
    let catalog = StaticCatalog::embedded().unwrap();
    let result = recommend_similar(&catalog, "Re:Zero", 5, &SimilarSettings::default())
        .await
        .unwrap();

    assert!(!result.is_empty() && result.len() <= 5);
    assert!(!ids(&result).contains(&31240));
    let mut unique = ids(&result);
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), result.len());

    // Direct entries come first
    let first_search = result.iter().position(|c| !c.is_direct());
    if let Some(pos) = first_search {
        assert!(result[pos..].iter().all(|c| !c.is_direct()));
    }
}

#[tokio::test]
async fn static_catalog_genre_pipeline() {
    let catalog = StaticCatalog::embedded().unwrap();
    let browser = GenreBrowser::new(&catalog);
    let page = browser.recommend_by_genre("Fantasy", 3, 1).await.unwrap();
    assert_eq!(page.items.len(), 3);
    assert!(page
        .items
        .iter()
        .all(|c| c.genres.iter().any(|g| g == "Fantasy")));
    // Fewer fantasy titles than one over-fetched page holds
    assert_eq!(page.page.last_page, 1);
    assert!(!page.page.has_next_page);
}
