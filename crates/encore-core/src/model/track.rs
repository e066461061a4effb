use serde::{Deserialize, Serialize};

use crate::error::IdentityError;
use crate::identity::compute_identity;
use crate::model::ids::SongId;
use crate::model::rank::{Rank, Year};

/// One observation of a song at a rank in a year's playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub year: Year,
    pub rank: Rank,
    pub name: String,
    /// Artist names in catalog order.
    pub artists: Vec<String>,
    /// Catalog track ID. The same song may carry different IDs across years.
    pub external_id: String,
    pub link: String,
}

impl TrackRecord {
    #[must_use]
    pub fn new(year: Year, rank: Rank, name: impl Into<String>, artists: Vec<String>) -> Self {
        Self {
            year,
            rank,
            name: name.into(),
            artists,
            external_id: String::new(),
            link: String::new(),
        }
    }

    #[must_use]
    pub fn with_external_id(mut self, id: impl Into<String>) -> Self {
        self.external_id = id.into();
        self
    }

    #[must_use]
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    pub fn identity(&self) -> Result<SongId, IdentityError> {
        compute_identity(&self.name, &self.artists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_record_builder() {
        let record = TrackRecord::new(2021, Rank::new(4).unwrap(), "Levitating", vec!["Dua Lipa".into()])
            .with_external_id("463CkQjx2Zk1yXoBuierM9")
            .with_link("https://open.spotify.com/track/463CkQjx2Zk1yXoBuierM9");

        assert_eq!(record.year, 2021);
        assert_eq!(record.rank.get(), 4);
        assert_eq!(record.external_id, "463CkQjx2Zk1yXoBuierM9");
        assert!(record.link.ends_with("463CkQjx2Zk1yXoBuierM9"));
    }

    #[test]
    fn test_track_record_identity_ignores_catalog_id() {
        let a = TrackRecord::new(2020, Rank::new(1).unwrap(), "Song", vec!["Band".into()])
            .with_external_id("single-id");
        let b = TrackRecord::new(2021, Rank::new(9).unwrap(), "Song", vec!["Band".into()])
            .with_external_id("album-id");
        assert_eq!(a.identity().unwrap(), b.identity().unwrap());
    }

    #[test]
    fn test_track_record_identity_error() {
        let record = TrackRecord::new(2020, Rank::new(1).unwrap(), "Song", Vec::new());
        assert_eq!(record.identity(), Err(IdentityError::NoArtists));
    }
}
