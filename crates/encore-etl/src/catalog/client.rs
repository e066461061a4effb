//! Spotify Web API client.
//!
//! Authenticates with the client-credentials grant, fetches playlists with
//! all of their track pages, and retries transient failures with
//! exponential backoff.

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::catalog::resilience::RateLimiter;
use crate::catalog::{Credentials, Playlist, PlaylistSource, PlaylistTrack};
use crate::error::{EtlError, EtlResult};

const SOURCE_NAME: &str = "Spotify";
const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";
const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

const REQUESTS_PER_SECOND: u32 = 10;
const MAX_RETRIES: usize = 3;

/// Tokens are refreshed once they are this close to expiring.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct PlaylistResponse {
    id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    public: Option<bool>,
    #[serde(default)]
    collaborative: bool,
    #[serde(default)]
    owner: Option<OwnerObject>,
    #[serde(default)]
    external_urls: ExternalUrls,
    tracks: TrackPage,
}

#[derive(Debug, Deserialize)]
struct OwnerObject {
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalUrls {
    #[serde(default)]
    spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<TrackItem>,
    #[serde(default)]
    next: Option<String>,
    #[serde(default)]
    total: u32,
}

#[derive(Debug, Deserialize)]
struct TrackItem {
    #[serde(default)]
    track: Option<TrackObject>,
}

#[derive(Debug, Deserialize)]
struct TrackObject {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    artists: Vec<ArtistObject>,
    #[serde(default)]
    external_urls: ExternalUrls,
}

#[derive(Debug, Deserialize)]
struct ArtistObject {
    name: String,
}

impl From<TrackObject> for PlaylistTrack {
    fn from(track: TrackObject) -> Self {
        Self {
            id: track.id,
            name: track.name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
            link: track.external_urls.spotify,
        }
    }
}

impl From<PlaylistResponse> for Playlist {
    fn from(response: PlaylistResponse) -> Self {
        Self {
            id: response.id,
            name: response.name,
            owner: response.owner.and_then(|o| o.display_name),
            description: response.description.filter(|d| !d.trim().is_empty()),
            public: response.public,
            collaborative: response.collaborative,
            url: response.external_urls.spotify,
            total_tracks: response.tracks.total,
            entries: response
                .tracks
                .items
                .into_iter()
                .map(|item| item.track.map(PlaylistTrack::from))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + TOKEN_EXPIRY_MARGIN < self.expires_at
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Spotify Web API client.
///
/// Wraps an HTTP client, the client credentials, a cached access token and
/// a rate limiter.
#[derive(Debug)]
pub struct SpotifyClient {
    http: Client,
    credentials: Credentials,
    token: Mutex<Option<AccessToken>>,
    rate_limiter: RateLimiter,
    api_base: String,
    token_url: String,
}

impl SpotifyClient {
    /// Create a client against the public Spotify endpoints.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(credentials: Credentials) -> EtlResult<Self> {
        Self::with_endpoints(credentials, SPOTIFY_API_BASE, SPOTIFY_TOKEN_URL)
    }

    /// Create a client against custom endpoints, e.g. a local stub server.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_endpoints(
        credentials: Credentials,
        api_base: impl Into<String>,
        token_url: impl Into<String>,
    ) -> EtlResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("encore/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            credentials,
            token: Mutex::new(None),
            rate_limiter: RateLimiter::new(REQUESTS_PER_SECOND),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token_url: token_url.into(),
        })
    }

    /// Fetch a playlist with every page of its tracks.
    ///
    /// # Errors
    /// Returns an error if the playlist cannot be loaded after retries.
    pub async fn fetch_playlist(&self, playlist_id: &str) -> EtlResult<Playlist> {
        let url = format!("{}/playlists/{}", self.api_base, playlist_id);
        let mut response: PlaylistResponse = self.get_json(&url).await?;

        let mut next = response.tracks.next.take();
        while let Some(page_url) = next {
            let mut page: TrackPage = self.get_json(&page_url).await?;
            next = page.next.take();
            response.tracks.items.append(&mut page.items);
        }

        log::debug!(
            "Fetched playlist {} with {} entries",
            playlist_id,
            response.tracks.items.len()
        );
        Ok(response.into())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> EtlResult<T> {
        (|| self.get_json_once::<T>(url))
            .retry(ExponentialBuilder::default().with_max_times(MAX_RETRIES))
            .when(EtlError::is_transient)
            .notify(|e: &EtlError, delay: Duration| {
                log::warn!("Retrying {} in {:?}: {}", url, delay, e);
            })
            .await
    }

    async fn get_json_once<T: DeserializeOwned>(&self, url: &str) -> EtlResult<T> {
        self.rate_limiter.acquire().await;
        let token = self.access_token().await?;

        let response = self.http.get(url).bearer_auth(&token).send().await?;
        let status = response.status();
        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED {
                // Force a new token on the retry.
                self.token.lock().await.take();
            }
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, url, body));
        }

        response.json::<T>().await.map_err(|e| EtlError::Parse {
            source_name: SOURCE_NAME.to_string(),
            message: e.to_string(),
        })
    }

    async fn access_token(&self) -> EtlResult<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }

        let fresh = self.request_token().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn request_token(&self) -> EtlResult<AccessToken> {
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(
                self.credentials.client_id(),
                Some(self.credentials.client_secret()),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &self.token_url, body));
        }

        let token: TokenResponse = response.json().await.map_err(|e| EtlError::Parse {
            source_name: SOURCE_NAME.to_string(),
            message: e.to_string(),
        })?;
        log::debug!("Obtained access token valid for {}s", token.expires_in);

        Ok(AccessToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }
}

#[async_trait]
impl PlaylistSource for SpotifyClient {
    async fn playlist(&self, playlist_id: &str) -> EtlResult<Playlist> {
        self.fetch_playlist(playlist_id).await
    }
}

/// Map a non-success status to an error; server errors, 401 and 429 are
/// transient.
fn classify_status(status: StatusCode, url: &str, body: String) -> EtlError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => EtlError::RateLimited {
            source_name: SOURCE_NAME.to_string(),
        },
        StatusCode::NOT_FOUND => EtlError::NotFound {
            entity: url.to_string(),
            source_name: SOURCE_NAME.to_string(),
        },
        s if s.is_server_error() || s == StatusCode::UNAUTHORIZED => EtlError::Http {
            source_name: SOURCE_NAME.to_string(),
            message: format!("{s}: {body}"),
        },
        s => EtlError::Rejected {
            source_name: SOURCE_NAME.to_string(),
            status: s.as_u16(),
            message: body,
        },
    }
}
