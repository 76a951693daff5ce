// Offline "similar titles" via a similarity backend, no catalog calls.

use super::RecommendError;
use crate::similarity::{ScoredTitle, SimilarityBackend};

/// Up to `n` titles whose descriptions are most like `title`'s.
pub fn recommend_offline(
    backend: &dyn SimilarityBackend,
    title: &str,
    n: usize,
) -> Result<Vec<ScoredTitle>, RecommendError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(RecommendError::InvalidInput(
            "please enter an anime title".to_string(),
        ));
    }

    let similar = backend
        .similar_titles(title, n)
        .ok_or_else(|| RecommendError::NotFound(title.to_string()))?;

    if similar.is_empty() {
        return Err(RecommendError::Empty(title.to_string()));
    }
    Ok(similar)
}
