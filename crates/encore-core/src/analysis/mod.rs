//! Trend analyses over a [`SongMatrix`].
//!
//! Every analysis is a pure read of the matrix. A [`TrendAnalyzer`] is a
//! borrowed view, so several analyses can run side by side over the same
//! snapshot. Results borrow the rows they describe.

pub mod artists;
pub mod summary;
pub mod trends;

pub use artists::ArtistStats;
pub use summary::SummaryStats;
pub use trends::{DreamRun, FirstToLast, OneTimer, Recovery, RecoveryType, Streak};

use crate::error::AnalysisError;
use crate::matrix::SongMatrix;

/// Default top-N band for [`TrendAnalyzer::one_year_dream_runs`].
pub const DEFAULT_DREAM_RUN_THRESHOLD: u32 = 10;

/// Default minimum length for [`TrendAnalyzer::active_streaks`].
pub const DEFAULT_MIN_CONSECUTIVE: usize = 3;

/// Songs need at least this many appearances to count for
/// [`TrendAnalyzer::on_the_up`].
pub const MIN_RECOVERY_APPEARANCES: u32 = 2;

/// Year-over-year analyses compare adjacent years and need at least two.
const MIN_TREND_YEARS: usize = 2;

/// Read-only analysis view over a non-empty matrix.
#[derive(Debug, Clone, Copy)]
pub struct TrendAnalyzer<'a> {
    matrix: &'a SongMatrix,
}

impl<'a> TrendAnalyzer<'a> {
    /// # Errors
    /// Returns [`AnalysisError::EmptyMatrix`] if the matrix has no songs.
    pub fn new(matrix: &'a SongMatrix) -> Result<Self, AnalysisError> {
        if matrix.is_empty() {
            return Err(AnalysisError::EmptyMatrix);
        }
        log::info!(
            "Analyzer initialized with {} songs across {} years",
            matrix.len(),
            matrix.years().len()
        );
        Ok(Self { matrix })
    }

    #[must_use]
    pub const fn matrix(&self) -> &'a SongMatrix {
        self.matrix
    }

    fn require_trend_years(&self, operation: &'static str) -> Result<(), AnalysisError> {
        let found = self.matrix.years().len();
        if found < MIN_TREND_YEARS {
            return Err(AnalysisError::InsufficientYears {
                operation,
                required: MIN_TREND_YEARS,
                found,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::matrix::{build_matrix, SongMatrix};
    use crate::model::{Rank, SongRow, TrackRecord, Year};

    /// Build a matrix from `(name, artists, [(year, rank)])` rows. Rank 0
    /// entries are skipped, so every year must be listed by some song.
    pub fn matrix(songs: &[(&str, &[&str], &[(Year, u32)])]) -> SongMatrix {
        let mut records = Vec::new();
        for (name, artists, ranks) in songs {
            for &(year, position) in *ranks {
                if let Some(rank) = Rank::new(position) {
                    records.push(TrackRecord::new(
                        year,
                        rank,
                        *name,
                        artists.iter().map(|a| (*a).to_string()).collect(),
                    ));
                }
            }
        }
        build_matrix(&records).unwrap()
    }

    /// The four-song history used across analysis tests.
    ///
    /// - A: #3 in 2018, then gone
    /// - B: #50 in 2018, gone in 2019, back at #20 in 2020
    /// - C: #5 every year
    /// - D: #7 in 2019 only
    pub fn scenario() -> SongMatrix {
        matrix(&[
            ("Song A", &["Artist 1"], &[(2018, 3), (2019, 0), (2020, 0)]),
            ("Song B", &["Artist 2"], &[(2018, 50), (2020, 20)]),
            ("Song C", &["Artist 3"], &[(2018, 5), (2019, 5), (2020, 5)]),
            ("Song D", &["Artist 4"], &[(2019, 7)]),
        ])
    }

    pub fn named<'a>(rows: impl IntoIterator<Item = &'a SongRow>) -> Vec<&'a str> {
        rows.into_iter().map(|row| row.name.as_str()).collect()
    }
}
