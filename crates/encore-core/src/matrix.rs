//! Pivot playlist entries into one row per song and one column per year.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::MatrixBuildError;
use crate::model::{Rank, SongId, SongRow, TrackRecord, Year};

/// Deduplicated songs over a sorted set of years.
///
/// Every row conceptually covers every year in [`SongMatrix::years`]; a year
/// without a rank in the row means the song was not listed that year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SongMatrix {
    years: Vec<Year>,
    rows: Vec<SongRow>,
}

impl SongMatrix {
    /// A matrix with no years and no songs.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Reassemble a matrix from previously built parts, e.g. a loaded
    /// snapshot. Rows are put in `song_id` order.
    ///
    /// # Errors
    /// Returns an error if `years` is not strictly ascending or a row has a
    /// rank for a year outside `years`.
    pub fn from_parts(years: Vec<Year>, mut rows: Vec<SongRow>) -> Result<Self, MatrixBuildError> {
        if years.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(MatrixBuildError::UnsortedYears);
        }
        for row in &rows {
            if let Some(year) = row.present_years().find(|y| years.binary_search(y).is_err()) {
                return Err(MatrixBuildError::UnknownYear {
                    song_id: row.song_id.clone(),
                    year,
                });
            }
        }
        rows.sort_by(|a, b| a.song_id.cmp(&b.song_id));
        Ok(Self { years, rows })
    }

    /// All matrix years, ascending.
    #[must_use]
    pub fn years(&self) -> &[Year] {
        &self.years
    }

    /// Songs in `song_id` order.
    #[must_use]
    pub fn rows(&self) -> &[SongRow] {
        &self.rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn first_year(&self) -> Option<Year> {
        self.years.first().copied()
    }

    #[must_use]
    pub fn last_year(&self) -> Option<Year> {
        self.years.last().copied()
    }

    #[must_use]
    pub fn get(&self, song_id: &SongId) -> Option<&SongRow> {
        self.rows
            .binary_search_by(|row| row.song_id.cmp(song_id))
            .ok()
            .map(|index| &self.rows[index])
    }
}

/// Records sharing one identity, accumulated during the pivot.
struct Group<'a> {
    representative: &'a TrackRecord,
    ranks: BTreeMap<Year, Rank>,
}

/// Build the year-rank matrix from raw playlist entries.
///
/// Records whose identity cannot be computed are dropped with a warning.
/// The representative record for a song (name, artists, catalog ID) is the
/// one from the lowest year, first in input order on ties. If a song is
/// listed more than once in a year, its best rank for that year is kept.
///
/// # Errors
/// Returns [`MatrixBuildError::NoValidRecords`] if `records` is non-empty
/// but every record is malformed.
pub fn build_matrix(records: &[TrackRecord]) -> Result<SongMatrix, MatrixBuildError> {
    if records.is_empty() {
        log::warn!("No records to process");
        return Ok(SongMatrix::empty());
    }

    let mut groups: BTreeMap<SongId, Group<'_>> = BTreeMap::new();
    let mut years = BTreeSet::new();
    let mut dropped = 0usize;

    for record in records {
        let song_id = match record.identity() {
            Ok(id) => id,
            Err(e) => {
                log::warn!(
                    "Dropping {} #{} ({:?}): {}",
                    record.year,
                    record.rank,
                    record.name,
                    e
                );
                dropped += 1;
                continue;
            }
        };
        years.insert(record.year);

        let group = groups.entry(song_id).or_insert_with(|| Group {
            representative: record,
            ranks: BTreeMap::new(),
        });
        if record.year < group.representative.year {
            group.representative = record;
        }
        group
            .ranks
            .entry(record.year)
            .and_modify(|existing| {
                log::debug!(
                    "{:?} listed twice in {}: #{} and #{}",
                    record.name,
                    record.year,
                    existing,
                    record.rank
                );
                if record.rank.beats(*existing) {
                    *existing = record.rank;
                }
            })
            .or_insert(record.rank);
    }

    if groups.is_empty() {
        return Err(MatrixBuildError::NoValidRecords { dropped });
    }

    let years: Vec<Year> = years.into_iter().collect();
    log::info!(
        "Processing {} records for years {:?} ({} dropped)",
        records.len(),
        years,
        dropped
    );

    let rows: Vec<SongRow> = groups
        .into_iter()
        .map(|(song_id, group)| {
            let rep = group.representative;
            SongRow::new(
                rep.name.clone(),
                rep.artists.clone(),
                song_id,
                rep.external_id.clone(),
                group.ranks,
            )
        })
        .collect();

    log::info!("Pivoted to {} unique songs", rows.len());
    Ok(SongMatrix { years, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(year: Year, rank: u32, name: &str, artists: &[&str]) -> TrackRecord {
        TrackRecord::new(
            year,
            Rank::new(rank).unwrap(),
            name,
            artists.iter().map(|a| (*a).to_string()).collect(),
        )
        .with_external_id(format!("{name}-{year}"))
    }

    fn sample() -> Vec<TrackRecord> {
        vec![
            record(2018, 3, "Song A", &["Artist 1"]),
            record(2018, 50, "Song B", &["Artist 2"]),
            record(2018, 5, "Song C", &["Artist 3", "Artist 1"]),
            record(2019, 5, "song c", &["artist 1", "ARTIST 3"]),
            record(2019, 7, "Song D", &["Artist 4"]),
            record(2020, 20, "Song B", &["Artist 2"]),
            record(2020, 5, "Song C", &["Artist 1", "Artist 3"]),
        ]
    }

    fn find<'a>(matrix: &'a SongMatrix, name: &str) -> &'a SongRow {
        matrix
            .rows()
            .iter()
            .find(|row| row.name.eq_ignore_ascii_case(name))
            .unwrap()
    }

    #[test]
    fn test_build_matrix_empty_input() {
        let matrix = build_matrix(&[]).unwrap();
        assert!(matrix.is_empty());
        assert!(matrix.years().is_empty());
    }

    #[test]
    fn test_build_matrix_years_sorted_union() {
        let mut records = sample();
        records.reverse();
        let matrix = build_matrix(&records).unwrap();
        assert_eq!(matrix.years(), &[2018, 2019, 2020]);
    }

    #[test]
    fn test_build_matrix_dedupes_across_formatting() {
        let matrix = build_matrix(&sample()).unwrap();
        assert_eq!(matrix.len(), 4);

        let song_c = find(&matrix, "Song C");
        assert_eq!(song_c.list_appearances(), 3);
        assert_eq!(song_c.rank_in(2019).map(Rank::get), Some(5));
    }

    #[test]
    fn test_build_matrix_representative_is_lowest_year() {
        let mut records = sample();
        // Put the 2019 spelling first in input order.
        records.swap(0, 3);
        let matrix = build_matrix(&records).unwrap();
        let song_c = find(&matrix, "Song C");
        assert_eq!(song_c.name, "Song C");
        assert_eq!(song_c.external_id, "Song C-2018");
    }

    #[test]
    fn test_build_matrix_representative_tie_is_first_seen() {
        let records = vec![
            record(2018, 1, "Song", &["Band"]).with_external_id("first"),
            record(2018, 2, "SONG", &["band"]).with_external_id("second"),
        ];
        let matrix = build_matrix(&records).unwrap();
        assert_eq!(matrix.len(), 1);
        assert_eq!(matrix.rows()[0].external_id, "first");
    }

    #[test]
    fn test_build_matrix_same_year_duplicate_keeps_best_rank() {
        let records = vec![
            record(2018, 40, "Song", &["Band"]),
            record(2018, 12, "Song", &["Band"]),
        ];
        let matrix = build_matrix(&records).unwrap();
        let row = &matrix.rows()[0];
        assert_eq!(row.rank_in(2018).map(Rank::get), Some(12));
        assert_eq!(row.list_appearances(), 1);
        assert_eq!(row.score(), 89);
    }

    #[test]
    fn test_build_matrix_scores() {
        let matrix = build_matrix(&sample()).unwrap();
        assert_eq!(find(&matrix, "Song A").score(), 98);
        assert_eq!(find(&matrix, "Song B").score(), 51 + 81);
        assert_eq!(find(&matrix, "Song D").score(), 94);
    }

    #[test]
    fn test_build_matrix_list_appearances_match_ranks() {
        let matrix = build_matrix(&sample()).unwrap();
        for row in matrix.rows() {
            let present = matrix
                .years()
                .iter()
                .filter(|&&year| row.rank_in(year).is_some())
                .count();
            assert_eq!(row.list_appearances() as usize, present);
        }
    }

    #[test]
    fn test_build_matrix_rows_sorted_by_song_id() {
        let matrix = build_matrix(&sample()).unwrap();
        let ids: Vec<&SongId> = matrix.rows().iter().map(|row| &row.song_id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_build_matrix_is_idempotent() {
        let records = sample();
        let first = build_matrix(&records).unwrap();
        let second = build_matrix(&records).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_build_matrix_drops_malformed_records() {
        let records = vec![
            record(2018, 1, "Song", &["Band"]),
            record(2018, 2, "", &["Band"]),
            record(2019, 1, "Other", &[]),
        ];
        let matrix = build_matrix(&records).unwrap();
        assert_eq!(matrix.len(), 1);
        // 2019 only had a malformed record.
        assert_eq!(matrix.years(), &[2018]);
    }

    #[test]
    fn test_build_matrix_all_malformed_is_error() {
        let records = vec![record(2018, 1, " ", &["Band"]), record(2018, 2, "Song", &[])];
        assert_eq!(
            build_matrix(&records),
            Err(MatrixBuildError::NoValidRecords { dropped: 2 })
        );
    }

    #[test]
    fn test_from_parts_rejects_unsorted_years() {
        assert_eq!(
            SongMatrix::from_parts(vec![2020, 2019], Vec::new()),
            Err(MatrixBuildError::UnsortedYears)
        );
        assert_eq!(
            SongMatrix::from_parts(vec![2019, 2019], Vec::new()),
            Err(MatrixBuildError::UnsortedYears)
        );
    }

    #[test]
    fn test_from_parts_rejects_unknown_year() {
        let built = build_matrix(&sample()).unwrap();
        let rows = built.rows().to_vec();
        let result = SongMatrix::from_parts(vec![2018, 2019], rows);
        assert!(matches!(
            result,
            Err(MatrixBuildError::UnknownYear { year: 2020, .. })
        ));
    }

    #[test]
    fn test_from_parts_round_trip() {
        let built = build_matrix(&sample()).unwrap();
        let mut rows = built.rows().to_vec();
        rows.reverse();
        let rebuilt = SongMatrix::from_parts(built.years().to_vec(), rows).unwrap();
        assert_eq!(rebuilt, built);
    }

    #[test]
    fn test_get_by_song_id() {
        let matrix = build_matrix(&sample()).unwrap();
        let song_d = find(&matrix, "Song D");
        assert_eq!(matrix.get(&song_d.song_id), Some(song_d));
        assert!(matrix.get(&SongId::from_digest("missing")).is_none());
    }
}
