use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::ids::SongId;
use crate::model::rank::{Rank, Year};

/// One deduplicated song with its rank in every year it was listed.
///
/// `list_appearances` and `score` are derived from `ranks` on construction
/// and cannot drift from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SongRow {
    pub name: String,
    pub artists: Vec<String>,
    pub song_id: SongId,
    /// Catalog ID of the representative record.
    pub external_id: String,
    list_appearances: u32,
    score: u32,
    ranks: BTreeMap<Year, Rank>,
}

impl SongRow {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        artists: Vec<String>,
        song_id: SongId,
        external_id: impl Into<String>,
        ranks: BTreeMap<Year, Rank>,
    ) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let list_appearances = ranks.len() as u32;
        let score = ranks.values().map(|rank| rank.points()).sum();

        Self {
            name: name.into(),
            artists,
            song_id,
            external_id: external_id.into(),
            list_appearances,
            score,
            ranks,
        }
    }

    /// Number of years the song was listed.
    #[must_use]
    pub const fn list_appearances(&self) -> u32 {
        self.list_appearances
    }

    /// Sum of [`Rank::points`] over listed years.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// Ranks for the years the song was listed. Unlisted years have no entry.
    #[must_use]
    pub const fn ranks(&self) -> &BTreeMap<Year, Rank> {
        &self.ranks
    }

    #[must_use]
    pub fn rank_in(&self, year: Year) -> Option<Rank> {
        self.ranks.get(&year).copied()
    }

    #[must_use]
    pub fn is_present(&self, year: Year) -> bool {
        self.ranks.contains_key(&year)
    }

    /// Years with a rank, ascending.
    pub fn present_years(&self) -> impl Iterator<Item = Year> + '_ {
        self.ranks.keys().copied()
    }
}
