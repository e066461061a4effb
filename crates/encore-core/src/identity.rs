//! Song identity: one key per song regardless of catalog ID, casing or
//! artist order.
//!
//! The key is the SHA-256 hex digest of the lowercased name followed by the
//! lowercased, sorted, space-joined artist names. Titles are compared as
//! written, so a remaster with a different title is a different song.

use sha2::{Digest, Sha256};

use crate::error::IdentityError;
use crate::model::SongId;

/// Compute the identity of a song from its name and artists.
///
/// # Errors
/// Returns [`IdentityError`] if the name is blank, the artist list is empty,
/// or any artist is blank.
pub fn compute_identity<S: AsRef<str>>(
    name: &str,
    artists: &[S],
) -> Result<SongId, IdentityError> {
    if name.trim().is_empty() {
        return Err(IdentityError::MissingName);
    }
    if artists.is_empty() {
        return Err(IdentityError::NoArtists);
    }
    if let Some(position) = artists.iter().position(|a| a.as_ref().trim().is_empty()) {
        return Err(IdentityError::BlankArtist { position });
    }

    let mut lowered: Vec<String> = artists.iter().map(|a| a.as_ref().to_lowercase()).collect();
    lowered.sort_unstable();

    let combined = format!("{} {}", name.to_lowercase(), lowered.join(" "));
    let digest = Sha256::digest(combined.as_bytes());

    Ok(SongId::from_digest(format!("{digest:x}")))
}
