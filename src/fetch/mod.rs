//! HTTP transport for the war API.
//!
//! [`WarSource`] is the seam between the aggregation core and the network.
//! [`ApiClient`] implements it over `reqwest`; tests supply in-memory
//! sources. No retries happen here: a failed request fails the pass.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::models::{ApiLeagueGroup, ApiTeamProfile, ApiWar};

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Invalid API token: {0}")]
    InvalidToken(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("War not found: {0}")]
    WarNotFound(String),
}

/// Source of league groups, wars and team profiles.
#[async_trait]
pub trait WarSource: Send + Sync {
    /// The team's current league group, or `None` when the team is not in
    /// a league season.
    async fn league_group(&self, team_tag: &str) -> Result<Option<ApiLeagueGroup>, FetchError>;

    /// A single league war by war tag.
    async fn war(&self, war_tag: &str) -> Result<ApiWar, FetchError>;

    /// The team's public profile.
    async fn team_profile(&self, team_tag: &str) -> Result<ApiTeamProfile, FetchError>;
}

/// Configuration for the API client.
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL including the version segment
    pub base_url: String,

    /// Bearer token
    pub token: String,

    /// Request timeout
    pub timeout: Duration,

    /// User agent string
    pub user_agent: String,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.clashofclans.com/v1".to_string(),
            token: String::new(),
            timeout: Duration::from_secs(25),
            user_agent: concat!("cwl-tracker/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// War API client.
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ApiClientConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("cwl-tracker")),
        );
        if !config.token.is_empty() {
            let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.token))
                .map_err(|e| FetchError::InvalidToken(e.to_string()))?;
            bearer.set_sensitive(true);
            headers.insert(AUTHORIZATION, bearer);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        // A trailing slash makes `Url::join` append rather than replace the
        // version segment.
        let base = format!("{}/", config.base_url.trim_end_matches('/'));
        let base_url =
            Url::parse(&base).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base, e)))?;

        Ok(Self { client, base_url })
    }

    /// Build an endpoint URL from path segments. Segments are
    /// percent-encoded, so `#` in a tag becomes `%23`.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET a JSON document. A 404 yields `Ok(None)`.
    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<Option<T>, FetchError> {
        debug!("GET {}", url);
        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await?;
        Ok(Some(serde_json::from_str(&body)?))
    }
}

#[async_trait]
impl WarSource for ApiClient {
    async fn league_group(&self, team_tag: &str) -> Result<Option<ApiLeagueGroup>, FetchError> {
        let url = self.endpoint(&["clans", team_tag, "currentwar", "leaguegroup"])?;
        info!("Fetching league group for {}", team_tag);
        self.get_json(&url).await
    }

    async fn war(&self, war_tag: &str) -> Result<ApiWar, FetchError> {
        let url = self.endpoint(&["clanwarleagues", "wars", war_tag])?;
        info!("Fetching war {}", war_tag);
        self.get_json(&url)
            .await?
            .ok_or_else(|| FetchError::WarNotFound(war_tag.to_string()))
    }

    async fn team_profile(&self, team_tag: &str) -> Result<ApiTeamProfile, FetchError> {
        let url = self.endpoint(&["clans", team_tag])?;
        info!("Fetching team profile for {}", team_tag);
        self.get_json(&url).await?.ok_or(FetchError::HttpStatus {
            status: 404,
            message: format!("Team {} not found", team_tag),
        })
    }
}
