use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::analysis::TrendAnalyzer;

/// Per-artist totals across the whole matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistStats {
    pub artist: String,
    /// Distinct songs credited to the artist.
    pub track_count: usize,
    /// Sum of `list_appearances` over those songs.
    pub total_appearances: u32,
    /// Mean song score over those songs.
    pub avg_score: f64,
}

impl TrendAnalyzer<'_> {
    /// Artists ranked by how many distinct songs they have in the matrix.
    ///
    /// Artist names are trimmed before grouping. Artists with equal
    /// `track_count` keep the order in which they were first encountered.
    pub fn most_popular_artists(&self) -> Vec<ArtistStats> {
        let mut order: Vec<&str> = Vec::new();
        let mut totals: HashMap<&str, (usize, u32, u64)> = HashMap::new();

        for row in self.matrix().rows() {
            let mut credited = HashSet::new();
            for artist in row.artists.iter().map(|a| a.trim()) {
                if artist.is_empty() || !credited.insert(artist) {
                    continue;
                }
                let entry = totals.entry(artist).or_insert_with(|| {
                    order.push(artist);
                    (0, 0, 0)
                });
                entry.0 += 1;
                entry.1 += row.list_appearances();
                entry.2 += u64::from(row.score());
            }
        }

        let mut stats: Vec<ArtistStats> = order
            .into_iter()
            .filter_map(|artist| {
                totals.get(artist).map(|&(track_count, total_appearances, score_sum)| {
                    #[allow(clippy::cast_precision_loss)]
                    let avg_score = score_sum as f64 / track_count as f64;
                    ArtistStats {
                        artist: artist.to_string(),
                        track_count,
                        total_appearances,
                        avg_score,
                    }
                })
            })
            .collect();

        stats.sort_by(|a, b| b.track_count.cmp(&a.track_count));
        log::info!("Found {} unique artists", stats.len());
        stats
    }
}
