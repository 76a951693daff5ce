// Local overlap scoring and the composite ranking order.
//
// The local score measures how much of the favorite's profile a candidate
// shares:
//
//   2 * |genres shared| + 1 * |themes shared| + 3 * |studios shared|
//
// Comparison is case-insensitive set intersection, so duplicate names within
// one list count once. Shared studio is the strongest signal, genre next,
// theme weakest.
//
// Ranking sorts by (direct first, external score desc, local score desc) and
// breaks any remaining tie by insertion order, explicitly rather than by
// relying on sort stability.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::normalize::Candidate;

/// Per-category weights for the overlap score.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapWeights {
    pub genre: u32,
    pub theme: u32,
    pub studio: u32,
}

impl Default for OverlapWeights {
    fn default() -> Self {
        Self {
            genre: 2,
            theme: 1,
            studio: 3,
        }
    }
}

/// The favorite's genres/themes/studios, case-folded once up front.
pub struct FavoriteProfile {
    genres: HashSet<String>,
    themes: HashSet<String>,
    studios: HashSet<String>,
}

impl FavoriteProfile {
    pub fn from_candidate(favorite: &Candidate) -> Self {
        Self {
            genres: fold(&favorite.genres),
            themes: fold(&favorite.themes),
            studios: fold(&favorite.studios),
        }
    }

    /// Weighted overlap between this profile and a candidate.
    pub fn local_score(&self, candidate: &Candidate, weights: &OverlapWeights) -> u32 {
        let genres = shared(&self.genres, &candidate.genres);
        let themes = shared(&self.themes, &candidate.themes);
        let studios = shared(&self.studios, &candidate.studios);

        genres * weights.genre + themes * weights.theme + studios * weights.studio
    }
}

/// Compare two candidates by the composite key, best first.
///
/// Does not consider insertion order; `rank` adds that as the last key.
pub fn compare(a: &Candidate, b: &Candidate) -> Ordering {
    b.is_direct()
        .cmp(&a.is_direct())
        .then_with(|| b.ranking_score().total_cmp(&a.ranking_score()))
        .then_with(|| b.local_score.cmp(&a.local_score))
}

/// Sort candidates best first. The input order is taken as insertion order
/// and decides ties on all three keys (earlier wins).
pub fn rank(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut indexed: Vec<(usize, Candidate)> = candidates.into_iter().enumerate().collect();
    indexed.sort_by(|(ia, a), (ib, b)| compare(a, b).then_with(|| ia.cmp(ib)));
    indexed.into_iter().map(|(_, c)| c).collect()
}

fn fold(names: &[String]) -> HashSet<String> {
    names.iter().map(|n| n.to_lowercase()).collect()
}

fn shared(favorite: &HashSet<String>, names: &[String]) -> u32 {
    fold(names).intersection(favorite).count() as u32
}
