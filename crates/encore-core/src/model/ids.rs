use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a song across playlists and catalog IDs.
///
/// Holds the lowercase hex digest produced by
/// [`compute_identity`](crate::identity::compute_identity).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongId(String);

impl SongId {
    /// Wrap an already computed digest, e.g. one read back from a snapshot.
    #[must_use]
    pub fn from_digest(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SongId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
