// TF-IDF vectorizer and precomputed cosine similarity matrix.
//
// Each item's description becomes one document. Tokens are runs of two or
// more word characters, lowercased, with English stop words removed; the
// vocabulary is unigrams plus bigrams of adjacent surviving tokens. Terms
// that appear in fewer than `min_df` documents, or in more than `max_df`
// of them (as a fraction), are dropped: the first are too rare to link two
// items, the second too common to tell them apart.
//
// Weights use the smoothed IDF
//
//   idf(t) = ln((1 + n) / (1 + df(t))) + 1
//
// and each document vector is L2-normalized, so cosine similarity is just
// the dot product. The full n x n matrix is computed once when the index is
// built; queries are a row lookup and a sort.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use anyhow::Result;
use regex_lite::Regex;
use stop_words::{get, LANGUAGE};
use tracing::info;

use super::{ScoredTitle, SimilarityBackend};

/// Vectorizer settings.
#[derive(Debug, Clone)]
pub struct TfIdfParams {
    /// Minimum number of documents a term must appear in
    pub min_df: usize,
    /// Maximum fraction of documents a term may appear in
    pub max_df: f64,
    /// Longest n-gram to include (1 = unigrams only, 2 = plus bigrams)
    pub max_ngram: usize,
}

impl Default for TfIdfParams {
    fn default() -> Self {
        Self {
            min_df: 2,
            max_df: 0.85,
            max_ngram: 2,
        }
    }
}

/// A sparse, L2-normalized document vector: (term index, weight), sorted by index.
pub type SparseVector = Vec<(usize, f64)>;

/// Turns documents into TF-IDF vectors over a pruned vocabulary.
pub struct TfIdfVectorizer {
    params: TfIdfParams,
    stop_words: HashSet<String>,
    token_pattern: Regex,
}

impl TfIdfVectorizer {
    pub fn new(params: TfIdfParams) -> Self {
        let stop_words: Vec<String> = get(LANGUAGE::English);
        Self {
            params,
            stop_words: stop_words.into_iter().collect(),
            // Same default token rule as most TF-IDF tooling: 2+ word chars
            token_pattern: Regex::new(r"\b\w\w+\b").expect("token pattern is valid"),
        }
    }

    /// Lowercased tokens with stop words removed, then joined into n-grams.
    pub fn terms(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = self
            .token_pattern
            .find_iter(&lower)
            .map(|m| m.as_str())
            .filter(|t| !self.stop_words.contains(*t))
            .collect();

        let mut terms = Vec::new();
        for n in 1..=self.params.max_ngram.max(1) {
            for window in tokens.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }

    /// Fit the vocabulary on `docs` and return one vector per document along
    /// with the vocabulary (term -> column).
    pub fn fit_transform(
        &self,
        docs: &[String],
    ) -> Result<(Vec<SparseVector>, BTreeMap<String, usize>)> {
        if docs.is_empty() {
            anyhow::bail!("No documents to vectorize");
        }

        let counts: Vec<HashMap<String, usize>> = docs
            .iter()
            .map(|doc| {
                let mut tf = HashMap::new();
                for term in self.terms(doc) {
                    *tf.entry(term).or_insert(0) += 1;
                }
                tf
            })
            .collect();

        let mut document_frequency: HashMap<&str, usize> = HashMap::new();
        for tf in &counts {
            for term in tf.keys() {
                *document_frequency.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let n_docs = docs.len() as f64;
        let max_docs = self.params.max_df * n_docs;
        let kept: BTreeSet<&str> = document_frequency
            .iter()
            .filter(|&(_, &df)| df >= self.params.min_df && df as f64 <= max_docs)
            .map(|(term, _)| *term)
            .collect();

        if kept.is_empty() {
            anyhow::bail!(
                "No terms left after pruning {} documents (min_df={}, max_df={})",
                docs.len(),
                self.params.min_df,
                self.params.max_df
            );
        }

        // BTreeSet iteration is sorted, so columns are stable across runs
        let vocabulary: BTreeMap<String, usize> = kept
            .iter()
            .enumerate()
            .map(|(i, term)| (term.to_string(), i))
            .collect();
        let idf: Vec<f64> = kept
            .iter()
            .map(|term| ((1.0 + n_docs) / (1.0 + document_frequency[term] as f64)).ln() + 1.0)
            .collect();

        let vectors = counts
            .iter()
            .map(|tf| {
                let mut vector: SparseVector = tf
                    .iter()
                    .filter_map(|(term, &count)| {
                        vocabulary
                            .get(term)
                            .map(|&col| (col, count as f64 * idf[col]))
                    })
                    .collect();
                vector.sort_by_key(|(col, _)| *col);
                l2_normalize(&mut vector);
                vector
            })
            .collect();

        info!(
            documents = docs.len(),
            vocabulary = vocabulary.len(),
            "Built TF-IDF vectors"
        );

        Ok((vectors, vocabulary))
    }
}

impl Default for TfIdfVectorizer {
    fn default() -> Self {
        Self::new(TfIdfParams::default())
    }
}

/// Titles plus their pairwise cosine similarities.
pub struct SimilarityIndex {
    titles: Vec<String>,
    matrix: Vec<Vec<f64>>,
}

impl SimilarityIndex {
    /// Build the index from (title, description) pairs.
    pub fn build(items: &[(String, String)], params: TfIdfParams) -> Result<Self> {
        let vectorizer = TfIdfVectorizer::new(params);
        let docs: Vec<String> = items.iter().map(|(_, text)| text.clone()).collect();
        let (vectors, _vocabulary) = vectorizer.fit_transform(&docs)?;

        let n = vectors.len();
        let mut matrix = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in i..n {
                let sim = dot(&vectors[i], &vectors[j]);
                matrix[i][j] = sim;
                matrix[j][i] = sim;
            }
        }

        Ok(Self {
            titles: items.iter().map(|(title, _)| title.clone()).collect(),
            matrix,
        })
    }

    /// Number of titles (rows) in the index.
    pub fn title_count(&self) -> usize {
        self.titles.len()
    }

    /// Row index for a title (case-insensitive exact match).
    pub fn position(&self, title: &str) -> Option<usize> {
        let wanted = title.trim().to_lowercase();
        self.titles.iter().position(|t| t.to_lowercase() == wanted)
    }

    /// Similarity between rows `i` and `j`.
    pub fn similarity(&self, i: usize, j: usize) -> Option<f64> {
        self.matrix.get(i)?.get(j).copied()
    }

    /// Up to `n` neighbours of row `index`, best first. Ties keep dataset order.
    pub fn neighbours(&self, index: usize, n: usize) -> Vec<ScoredTitle> {
        let Some(row) = self.matrix.get(index) else {
            return Vec::new();
        };

        let mut scored: Vec<(usize, f64)> = row
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != index)
            .map(|(j, &s)| (j, s))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        scored
            .into_iter()
            .take(n)
            .map(|(j, score)| ScoredTitle {
                index: j,
                title: self.titles[j].clone(),
                score,
            })
            .collect()
    }
}

impl SimilarityBackend for SimilarityIndex {
    fn similar_titles(&self, title: &str, n: usize) -> Option<Vec<ScoredTitle>> {
        let index = self.position(title)?;
        Some(self.neighbours(index, n))
    }
}

fn l2_normalize(vector: &mut SparseVector) {
    let norm = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for (_, w) in vector.iter_mut() {
            *w /= norm;
        }
    }
}

/// Dot product of two index-sorted sparse vectors.
fn dot(a: &SparseVector, b: &SparseVector) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut sum = 0.0;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}
