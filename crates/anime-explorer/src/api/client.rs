//! Jikan API client for the anime search and detail endpoints.

use super::error::{ApiError, ApiResult};
use super::throttle::ThrottledGate;
use super::transport::{HttpTransport, Transport};
use super::types::{AnimeDetailsResponse, AnimeListResponse};
use crate::query::QueryState;
use reqwest::Url;
use serde::de::DeserializeOwned;
use shared::config::ApiConfig;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Jikan API v4 client
///
/// Holds no timing logic of its own; spacing is the job of whatever
/// [`Transport`] it is built with (normally a `ThrottledGate`).
pub struct JikanClient<T> {
    /// Network-call primitive
    transport: T,
    /// Anime collection endpoint, e.g. `https://api.jikan.moe/v4/anime`
    base_url: Url,
}

impl<T: Transport> JikanClient<T> {
    /// Create a new Jikan client
    pub fn new(transport: T, base_url: &str) -> ApiResult<Self> {
        let base_url = parse_url(base_url.trim_end_matches('/'))?;
        Ok(Self {
            transport,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// URL for a search request
    pub fn search_url(&self, query: &QueryState) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().extend_pairs(query.params());
        url
    }

    /// URL for the full details of one anime
    pub fn details_url(&self, mal_id: u32) -> ApiResult<Url> {
        parse_url(&format!("{}/{}/full", self.base_url, mal_id))
    }

    /// Fetch one page of search results
    pub async fn search(&self, query: &QueryState) -> ApiResult<AnimeListResponse> {
        let url = self.search_url(query);
        self.get(&url).await
    }

    /// Fetch full anime details by MAL ID
    pub async fn get_anime_details(&self, mal_id: u32) -> ApiResult<AnimeDetailsResponse> {
        let url = self.details_url(mal_id)?;
        self.get(&url).await
    }

    /// GET and decode; any non-success status is an error
    async fn get<R: DeserializeOwned>(&self, url: &Url) -> ApiResult<R> {
        debug!(url = %url, "Making API request");

        let response = self.transport.get(url).await.map_err(|e| {
            warn!(url = %url, error = %e, "Request error");
            e
        })?;

        if !response.status.is_success() {
            warn!(url = %url, status = %response.status, "Request failed");
            return Err(ApiError::Status {
                status: response.status,
                body: response.body,
            });
        }

        serde_json::from_str(&response.body).map_err(|e| {
            warn!(url = %url, error = %e, "Failed to parse response");
            ApiError::from(e)
        })
    }
}

impl JikanClient<ThrottledGate<HttpTransport>> {
    /// Client over reqwest, throttled as configured in `[api]`
    pub fn from_config(config: &ApiConfig) -> ApiResult<Self> {
        let base_url = parse_url(config.base_url.trim_end_matches('/'))?;
        let transport = HttpTransport::new(
            &config.user_agent,
            config.request_timeout_secs.map(Duration::from_secs),
        )?;
        let min_interval = Duration::from_millis(config.min_interval_ms);

        info!(
            base_url = %base_url,
            min_interval_ms = config.min_interval_ms,
            "Creating throttled API client"
        );
        let gate = ThrottledGate::new(transport, &base_url, min_interval);
        Ok(Self {
            transport: gate,
            base_url,
        })
    }
}

fn parse_url(raw: &str) -> ApiResult<Url> {
    Url::parse(raw).map_err(|e| ApiError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}
