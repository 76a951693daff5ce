// Raw catalog records as they come off the wire.
//
// Jikan responses are loosely shaped: fields go missing, come back as null,
// or occasionally change type between endpoints (the recommendation entries
// are a trimmed-down version of the full anime object). Every field here is
// deserialized leniently so that one odd field never throws away the whole
// record. Turning these into something the ranking code can trust is the
// normalizer's job, not this module's.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A single anime record from a catalog source.
///
/// Genre/theme/studio/producer lists are kept as raw JSON values because
/// their elements are only usable when they are objects carrying a `name`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogRecord {
    #[serde(default, deserialize_with = "lenient_id")]
    pub mal_id: Option<u64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    /// MyAnimeList community score (0-10)
    #[serde(default, deserialize_with = "lenient_float")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub synopsis: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub genres: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub themes: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub studios: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub producers: Vec<Value>,
    /// Image links, nested as `images.jpg.{image_url,large_image_url}`
    #[serde(default)]
    pub images: Option<Value>,
}

/// Pagination metadata attached to list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PaginationInfo {
    #[serde(default, deserialize_with = "lenient_id")]
    pub last_visible_page: Option<u64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub has_next_page: bool,
    #[serde(default, deserialize_with = "lenient_id")]
    pub current_page: Option<u64>,
}

/// A genre entry from the genre listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GenreEntry {
    #[serde(default, deserialize_with = "lenient_id")]
    pub mal_id: Option<u64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
}

/// Non-negative integers, including integral floats like `5114.0`.
pub(crate) fn lenient_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.as_ref().and_then(id_from_value))
}

fn id_from_value(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
            .map(|f| f as u64)
    })
}

pub(crate) fn lenient_string<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// Non-finite numbers are treated as missing so they can't poison a sort.
pub(crate) fn lenient_float<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.and_then(|v| v.as_f64()).filter(|f| f.is_finite()))
}

pub(crate) fn lenient_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Value>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    })
}

/// A list of records where any element that fails to decode (null, a bare
/// string, a wrong-typed object) is skipped instead of failing the list.
pub(crate) fn lenient_items<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(lenient_list(d)?
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

pub(crate) fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.and_then(|v| v.as_bool()).unwrap_or(false))
}
