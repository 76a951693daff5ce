// Offline similarity: TF-IDF vectors over synopses plus a cosine matrix.

pub mod tfidf;

use serde::Serialize;

/// A neighbouring title and how similar it is to the query title.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTitle {
    /// Row of the title in the dataset the index was built from
    pub index: usize,
    pub title: String,
    /// Cosine similarity in [0, 1]
    pub score: f64,
}

/// Trait for "given a title, which titles are most like it".
///
/// The offline recommender only needs this contract, so a different
/// similarity model can be dropped in without touching the callers.
pub trait SimilarityBackend: Send + Sync {
    /// Up to `n` titles most similar to `title`, best first, never including
    /// `title` itself. `None` when the title isn't in the dataset.
    fn similar_titles(&self, title: &str, n: usize) -> Option<Vec<ScoredTitle>>;
}
