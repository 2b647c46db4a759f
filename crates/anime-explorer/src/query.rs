//! Search, filter and sort state and its translation into query parameters.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Results requested per page
pub const PAGE_SIZE: u32 = 24;

/// Anime type filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AnimeType {
    Tv,
    Movie,
    Ova,
    Special,
    Ona,
    Music,
}

impl AnimeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnimeType::Tv => "tv",
            AnimeType::Movie => "movie",
            AnimeType::Ova => "ova",
            AnimeType::Special => "special",
            AnimeType::Ona => "ona",
            AnimeType::Music => "music",
        }
    }
}

/// Airing status filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AnimeStatus {
    Airing,
    Complete,
    Upcoming,
}

impl AnimeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnimeStatus::Airing => "airing",
            AnimeStatus::Complete => "complete",
            AnimeStatus::Upcoming => "upcoming",
        }
    }
}

/// Field to order results by (always descending)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[value(name = "mal_id")]
    MalId,
    Title,
    #[value(name = "start_date")]
    StartDate,
    #[value(name = "end_date")]
    EndDate,
    Episodes,
    Score,
    #[value(name = "scored_by")]
    ScoredBy,
    Rank,
    Popularity,
    Members,
    Favorites,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::MalId => "mal_id",
            SortKey::Title => "title",
            SortKey::StartDate => "start_date",
            SortKey::EndDate => "end_date",
            SortKey::Episodes => "episodes",
            SortKey::Score => "score",
            SortKey::ScoredBy => "scored_by",
            SortKey::Rank => "rank",
            SortKey::Popularity => "popularity",
            SortKey::Members => "members",
            SortKey::Favorites => "favorites",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(AnimeType, AnimeStatus, SortKey);

/// What the user searched for and how results are filtered and sorted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub search_term: String,
    pub anime_type: Option<AnimeType>,
    pub status: Option<AnimeStatus>,
    pub sort: Option<SortKey>,
}

impl SearchCriteria {
    /// Search term with surrounding whitespace removed, None when blank
    pub fn trimmed_term(&self) -> Option<&str> {
        let term = self.search_term.trim();
        (!term.is_empty()).then_some(term)
    }
}

/// Criteria plus the page they apply to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryState {
    pub criteria: SearchCriteria,
    pub page: u32,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            criteria: SearchCriteria::default(),
            page: 1,
        }
    }
}

impl QueryState {
    /// Build a query for `page`; page 0 is treated as page 1
    pub fn new(criteria: SearchCriteria, page: u32) -> Self {
        Self {
            criteria,
            page: page.max(1),
        }
    }

    /// Same criteria, different page
    pub fn with_page(&self, page: u32) -> Self {
        Self::new(self.criteria.clone(), page)
    }

    /// Query parameters for the search endpoint, in request order
    ///
    /// Optional parameters appear only when set; the search term is trimmed and
    /// omitted when blank. URL encoding happens when the URL is built.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("limit", PAGE_SIZE.to_string()),
        ];

        if let Some(term) = self.criteria.trimmed_term() {
            params.push(("q", term.to_string()));
        }
        if let Some(anime_type) = self.criteria.anime_type {
            params.push(("type", anime_type.as_str().to_string()));
        }
        if let Some(status) = self.criteria.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(sort) = self.criteria.sort {
            params.push(("order_by", sort.as_str().to_string()));
            params.push(("sort", "desc".to_string()));
        }

        params
    }
}
