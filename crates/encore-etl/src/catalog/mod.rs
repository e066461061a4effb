//! Catalog access: credentials, the Spotify client, and the
//! [`PlaylistSource`] seam the pipeline fetches through.

pub mod client;
pub mod resilience;
pub mod source;

pub use client::SpotifyClient;
pub use source::{collect_tracklist, playlist_records, Playlist, PlaylistSource, PlaylistTrack};

use std::fmt;

/// Client-credentials pair for the catalog API.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
}

impl Credentials {
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}
