use serde::Serialize;

use crate::analysis::TrendAnalyzer;
use crate::model::Year;

/// High-level counts for a matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total_unique_songs: usize,
    /// Listed (song, year) pairs across the whole matrix.
    pub total_entries: usize,
    pub avg_appearances: f64,
    pub year_span: (Year, Year),
    pub year_count: usize,
    /// Leader of [`TrendAnalyzer::most_popular_artists`]; `None` when no
    /// song credits an artist.
    pub top_artist: Option<String>,
}

impl TrendAnalyzer<'_> {
    pub fn summary_stats(&self) -> SummaryStats {
        let matrix = self.matrix();
        let rows = matrix.rows();
        let years = matrix.years();

        let total_entries: usize = rows.iter().map(|row| row.ranks().len()).sum();
        let appearances: u64 = rows.iter().map(|row| u64::from(row.list_appearances())).sum();
        #[allow(clippy::cast_precision_loss)]
        let avg_appearances = appearances as f64 / rows.len() as f64;

        // An analyzer is never built over an empty matrix, so years exist.
        let year_span = (
            years.first().copied().unwrap_or_default(),
            years.last().copied().unwrap_or_default(),
        );

        SummaryStats {
            total_unique_songs: rows.len(),
            total_entries,
            avg_appearances,
            year_span,
            year_count: years.len(),
            top_artist: self
                .most_popular_artists()
                .into_iter()
                .next()
                .map(|stats| stats.artist),
        }
    }
}
