// Recommendation entry points: similar-to-favorite, by genre, and offline.

pub mod genre;
pub mod offline;
pub mod scoring;
pub mod similar;

/// Why a recommendation request produced nothing.
///
/// None of these are fatal: the caller shows the message and lets the
/// user try again.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecommendError {
    #[error("Could not find '{0}'. Check the spelling or try another title.")]
    NotFound(String),

    #[error("Could not fetch full details for '{0}'.")]
    DetailUnavailable(String),

    #[error("Genre '{0}' is not a known genre.")]
    UnknownGenre(String),

    #[error("No recommendations could be compiled for '{0}'.")]
    Empty(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
