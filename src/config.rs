use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;

use crate::catalog::jikan::DEFAULT_JIKAN_API_URL;
use crate::catalog::rate_limiter::DEFAULT_REQUEST_DELAY;
use crate::recommend::similar::{SimilarSettings, DEFAULT_TOP_N};

/// Which catalog to read anime data from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CatalogBackend {
    /// Live MyAnimeList data through the Jikan API (default)
    Jikan,
    /// The small dataset embedded in the binary; no network needed
    Static,
}

/// Central configuration loaded from environment variables.
///
/// Nothing here is secret; Jikan needs no API key. The .env file is loaded
/// automatically at startup via dotenvy, and CLI flags override these values.
pub struct Config {
    /// Jikan API base URL (defaults to https://api.jikan.moe/v4)
    pub jikan_api_url: String,
    pub catalog_backend: CatalogBackend,
    /// Minimum spacing between Jikan requests
    pub request_delay: Duration,
    /// Default number of "similar" recommendations
    pub top_n: usize,
    /// Multiplier on top_n that gates the second supplementary search
    pub second_query_factor: f64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every value has a default; only malformed values are an error.
    pub fn load() -> Result<Self> {
        let catalog_backend = match env::var("ANIREC_SOURCE").as_deref() {
            Ok("static") => CatalogBackend::Static,
            // "jikan" or unset both default to the live API
            Ok("jikan") | Err(_) => CatalogBackend::Jikan,
            Ok(other) => anyhow::bail!(
                "ANIREC_SOURCE must be 'jikan' or 'static', got '{other}'"
            ),
        };

        let delay_ms: u64 = parse_var(
            "ANIREC_REQUEST_DELAY_MS",
            DEFAULT_REQUEST_DELAY.as_millis() as u64,
        )?;

        let config = Self {
            jikan_api_url: env::var("JIKAN_API_URL")
                .unwrap_or_else(|_| DEFAULT_JIKAN_API_URL.to_string()),
            catalog_backend,
            request_delay: Duration::from_millis(delay_ms),
            top_n: parse_var("ANIREC_TOP_N", DEFAULT_TOP_N)?,
            second_query_factor: parse_var(
                "ANIREC_SECOND_QUERY_FACTOR",
                SimilarSettings::default().second_query_factor,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the numeric settings make sense.
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            anyhow::bail!("ANIREC_TOP_N must be at least 1");
        }
        if !self.second_query_factor.is_finite() || self.second_query_factor < 0.0 {
            anyhow::bail!(
                "ANIREC_SECOND_QUERY_FACTOR must be a non-negative number, got {}",
                self.second_query_factor
            );
        }
        Ok(())
    }

    /// Pipeline settings derived from this config.
    pub fn similar_settings(&self) -> SimilarSettings {
        SimilarSettings {
            second_query_factor: self.second_query_factor,
            ..SimilarSettings::default()
        }
    }
}

/// Parse an env var, falling back to `default` when unset.
fn parse_var<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            anyhow::anyhow!(
                "{key} has an invalid value '{raw}'.\n\
                 Fix it in your .env file or unset it to use the default."
            )
        }),
        Err(_) => Ok(default),
    }
}
