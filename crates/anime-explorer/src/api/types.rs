//! Jikan API v4 response types.
//!
//! These types represent the JSON responses from the anime endpoints. The API
//! omits or nulls fields freely, so nearly everything is optional.

use serde::{Deserialize, Serialize};

/// Response of the anime search endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnimeListResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<AnimeEntry>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Response of the `/{id}/full` endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnimeDetailsResponse {
    #[serde(default)]
    pub data: Option<AnimeDetails>,
}

/// Pagination metadata
///
/// Page numbers are kept as reported, out-of-range values included;
/// `PaginationInfo` clamps them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub last_visible_page: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_next_page: bool,
    #[serde(default)]
    pub current_page: Option<i64>,
}

/// Anime entry as returned in search results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnimeEntry {
    pub mal_id: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub images: Option<AnimeImages>,
    #[serde(rename = "type", default)]
    pub anime_type: Option<String>,
    #[serde(default)]
    pub episodes: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub aired: Option<Aired>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<MalEntity>,
}

/// Full anime details
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnimeDetails {
    pub mal_id: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub images: Option<AnimeImages>,

    // Type and status
    #[serde(rename = "type", default)]
    pub anime_type: Option<String>,
    #[serde(default)]
    pub episodes: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,

    // Dates
    #[serde(default)]
    pub aired: Option<Aired>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,

    // Scores and rankings
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub scored_by: Option<u32>,
    #[serde(default)]
    pub rank: Option<u32>,

    // Synopsis
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub background: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub studios: Vec<MalEntity>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<MalEntity>,
}

/// Anime images
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnimeImages {
    #[serde(default)]
    pub jpg: Option<ImageSet>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageSet {
    pub image_url: Option<String>,
    pub small_image_url: Option<String>,
    pub large_image_url: Option<String>,
}

/// Aired dates (ISO 8601 timestamps)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Aired {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

/// MAL entity (genre, studio, producer, etc.)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MalEntity {
    #[serde(default)]
    pub mal_id: u32,
    #[serde(rename = "type", default)]
    pub entity_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

impl AnimeImages {
    fn jpg(&self) -> Option<&ImageSet> {
        self.jpg.as_ref()
    }
}

impl AnimeEntry {
    /// Card image URL
    pub fn image_url(&self) -> Option<&str> {
        self.images
            .as_ref()
            .and_then(AnimeImages::jpg)
            .and_then(|jpg| jpg.image_url.as_deref())
    }
}

impl AnimeDetails {
    /// Detail-view image URL
    pub fn large_image_url(&self) -> Option<&str> {
        self.images
            .as_ref()
            .and_then(AnimeImages::jpg)
            .and_then(|jpg| jpg.large_image_url.as_deref())
    }
}

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
