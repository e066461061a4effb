//! CSV snapshots: the raw tracklist and the processed matrix.
//!
//! The raw tracklist has the columns `year, index, name, artists, id, link`.
//! The processed matrix has `name, artists, song_id, id, list_appearances,
//! score` followed by one column per year holding the rank, `0` when the
//! song was not listed.

use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Writer};
use serde::{Deserialize, Serialize};

use encore_core::{Rank, SongId, SongMatrix, SongRow, TrackRecord, Year};

use crate::error::{EtlError, EtlResult};

const MATRIX_COLUMNS: [&str; 6] = [
    "name",
    "artists",
    "song_id",
    "id",
    "list_appearances",
    "score",
];

#[derive(Debug, Serialize)]
struct TracklistRowRef<'a> {
    year: Year,
    index: u32,
    name: &'a str,
    artists: String,
    id: &'a str,
    link: &'a str,
}

#[derive(Debug, Deserialize)]
struct TracklistRow {
    year: Year,
    index: u32,
    name: String,
    artists: String,
    #[serde(default)]
    id: String,
    #[serde(default)]
    link: String,
}

fn invalid(line: u64, message: impl Into<String>) -> EtlError {
    EtlError::InvalidTable {
        line,
        message: message.into(),
    }
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, csv::Position::line)
}

// ---------------------------------------------------------------------------
// Artist lists
// ---------------------------------------------------------------------------

/// Encode an artist list for a table cell.
pub fn encode_artists(artists: &[String]) -> String {
    serde_json::to_string(artists).unwrap_or_else(|_| String::from("[]"))
}

/// Decode an artist list cell.
///
/// Accepts a JSON array (`["A", "B"]`) or the single-quoted list literal of
/// older snapshots (`['A', 'B']`, with double quotes around names that
/// contain an apostrophe). A cell without brackets is one artist; a blank
/// cell is none.
///
/// # Errors
/// Returns a description of the problem if a bracketed cell is neither
/// form.
pub fn decode_artists(cell: &str) -> Result<Vec<String>, String> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if !trimmed.starts_with('[') {
        return Ok(vec![trimmed.to_string()]);
    }
    if let Ok(artists) = serde_json::from_str::<Vec<String>>(trimmed) {
        return Ok(artists);
    }
    parse_list_literal(trimmed).ok_or_else(|| format!("cannot decode artist list {trimmed:?}"))
}

/// Parse `['A', "B's"]` style literals.
fn parse_list_literal(text: &str) -> Option<Vec<String>> {
    let inner = text.strip_prefix('[')?.strip_suffix(']')?;
    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(quote) = chars.next() else {
            break;
        };
        if quote != '\'' && quote != '"' {
            return None;
        }

        let mut item = String::new();
        loop {
            match chars.next()? {
                '\\' => item.push(chars.next()?),
                c if c == quote => break,
                c => item.push(c),
            }
        }
        items.push(item);

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            Some(',') => {}
            None => break,
            Some(_) => return None,
        }
    }

    Some(items)
}

// ---------------------------------------------------------------------------
// Raw tracklist
// ---------------------------------------------------------------------------

/// Write the raw tracklist snapshot to `path`.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_tracklist(path: &Path, records: &[TrackRecord]) -> EtlResult<()> {
    write_tracklist_to(File::create(path)?, records)?;
    log::info!("Saved {} tracks to {}", records.len(), path.display());
    Ok(())
}

/// Write the raw tracklist as CSV to any writer.
///
/// # Errors
/// Returns an error if writing fails.
pub fn write_tracklist_to<W: io::Write>(writer: W, records: &[TrackRecord]) -> EtlResult<()> {
    let mut csv = Writer::from_writer(writer);
    for record in records {
        csv.serialize(TracklistRowRef {
            year: record.year,
            index: record.rank.get(),
            name: &record.name,
            artists: encode_artists(&record.artists),
            id: &record.external_id,
            link: &record.link,
        })?;
    }
    csv.flush()?;
    Ok(())
}

/// Read the raw tracklist snapshot from `path`.
///
/// # Errors
/// Returns an error if the file cannot be read or a row is malformed.
pub fn read_tracklist(path: &Path) -> EtlResult<Vec<TrackRecord>> {
    let records = read_tracklist_from(File::open(path)?)?;
    log::info!("Loaded {} tracks from {}", records.len(), path.display());
    Ok(records)
}

/// Read a raw tracklist from any reader.
///
/// # Errors
/// Returns [`EtlError::InvalidTable`] for a row with rank 0 or an
/// undecodable artist list, and [`EtlError::Csv`] for rows that do not fit
/// the columns.
pub fn read_tracklist_from<R: io::Read>(reader: R) -> EtlResult<Vec<TrackRecord>> {
    let mut csv = ReaderBuilder::new().from_reader(reader);
    let headers = csv.headers()?.clone();
    let mut records = Vec::new();

    for result in csv.records() {
        let raw = result?;
        let line = line_of(&raw);
        let row: TracklistRow = raw.deserialize(Some(&headers))?;

        let rank = Rank::new(row.index).ok_or_else(|| invalid(line, "index must be at least 1"))?;
        let artists = decode_artists(&row.artists).map_err(|message| invalid(line, message))?;

        records.push(
            TrackRecord::new(row.year, rank, row.name, artists)
                .with_external_id(row.id)
                .with_link(row.link),
        );
    }

    Ok(records)
}

// ---------------------------------------------------------------------------
// Processed matrix
// ---------------------------------------------------------------------------

/// Write the processed matrix snapshot to `path`.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_matrix(path: &Path, matrix: &SongMatrix) -> EtlResult<()> {
    write_matrix_to(File::create(path)?, matrix)?;
    log::info!("Processed data saved to {}", path.display());
    Ok(())
}

/// Write the processed matrix as CSV to any writer.
///
/// # Errors
/// Returns an error if writing fails.
pub fn write_matrix_to<W: io::Write>(writer: W, matrix: &SongMatrix) -> EtlResult<()> {
    let mut csv = Writer::from_writer(writer);

    let mut header: Vec<String> = MATRIX_COLUMNS.iter().map(ToString::to_string).collect();
    header.extend(matrix.years().iter().map(ToString::to_string));
    csv.write_record(&header)?;

    for row in matrix.rows() {
        let mut fields = vec![
            row.name.clone(),
            encode_artists(&row.artists),
            row.song_id.to_string(),
            row.external_id.clone(),
            row.list_appearances().to_string(),
            row.score().to_string(),
        ];
        fields.extend(
            matrix
                .years()
                .iter()
                .map(|&year| row.rank_in(year).map_or(0, Rank::get).to_string()),
        );
        csv.write_record(&fields)?;
    }

    csv.flush()?;
    Ok(())
}

/// Read the processed matrix snapshot from `path`.
///
/// # Errors
/// Returns an error if the file cannot be read or is malformed.
pub fn read_matrix(path: &Path) -> EtlResult<SongMatrix> {
    read_matrix_from(File::open(path)?)
}

/// Positions of the labelled columns in a matrix header.
struct MatrixColumns {
    name: usize,
    artists: usize,
    song_id: usize,
    id: Option<usize>,
    list_appearances: Option<usize>,
    score: Option<usize>,
    /// (column, year) in ascending year order.
    years: Vec<(usize, Year)>,
}

impl MatrixColumns {
    fn locate(headers: &StringRecord) -> EtlResult<Self> {
        let find = |label: &str| headers.iter().position(|h| h.trim() == label);
        let require = |label: &str| find(label).ok_or_else(|| invalid(1, format!("missing column {label:?}")));

        let mut years: Vec<(usize, Year)> = headers
            .iter()
            .enumerate()
            .filter_map(|(column, header)| header.trim().parse::<Year>().ok().map(|year| (column, year)))
            .collect();
        years.sort_by_key(|&(_, year)| year);
        if let Some(pair) = years.windows(2).find(|pair| pair[0].1 == pair[1].1) {
            return Err(invalid(1, format!("duplicate year column {}", pair[0].1)));
        }

        Ok(Self {
            name: require("name")?,
            artists: require("artists")?,
            song_id: require("song_id")?,
            id: find("id"),
            list_appearances: find("list_appearances"),
            score: find("score"),
            years,
        })
    }
}

/// Parse a numeric cell written as an integer or a whole float (`7`, `7.0`).
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_count(cell: &str) -> Option<u32> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Some(0);
    }
    if let Ok(value) = trimmed.parse::<u32>() {
        return Some(value);
    }
    let value = trimmed.parse::<f64>().ok()?;
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return None;
    }
    Some(value as u32)
}

/// Read a processed matrix from any reader.
///
/// Columns are located by label. `list_appearances` and `score` are derived
/// again from the ranks; stored values that disagree are logged.
///
/// # Errors
/// Returns [`EtlError::InvalidTable`] for missing columns, duplicate year
/// columns, or cells that are not counts.
pub fn read_matrix_from<R: io::Read>(reader: R) -> EtlResult<SongMatrix> {
    let mut csv = ReaderBuilder::new().from_reader(reader);
    let columns = MatrixColumns::locate(csv.headers()?)?;
    let mut rows = Vec::new();

    for result in csv.records() {
        let record = result?;
        let line = line_of(&record);
        let cell = |column: usize| record.get(column).unwrap_or_default();
        let count = |column: usize, label: &str| {
            parse_count(cell(column)).ok_or_else(|| invalid(line, format!("{label} is not a count: {:?}", cell(column))))
        };

        let mut ranks = BTreeMap::new();
        for &(column, year) in &columns.years {
            if let Some(rank) = Rank::new(count(column, &year.to_string())?) {
                ranks.insert(year, rank);
            }
        }

        let song_id = cell(columns.song_id).trim();
        if song_id.is_empty() {
            return Err(invalid(line, "empty song_id"));
        }
        let artists = decode_artists(cell(columns.artists)).map_err(|message| invalid(line, message))?;

        let row = SongRow::new(
            cell(columns.name),
            artists,
            SongId::from_digest(song_id),
            columns.id.map(cell).unwrap_or_default(),
            ranks,
        );

        if let Some(column) = columns.score {
            let stored = count(column, "score")?;
            if stored != row.score() {
                log::warn!("Line {}: stored score {} recomputed as {}", line, stored, row.score());
            }
        }
        if let Some(column) = columns.list_appearances {
            let stored = count(column, "list_appearances")?;
            if stored != row.list_appearances() {
                log::warn!(
                    "Line {}: stored list_appearances {} recomputed as {}",
                    line,
                    stored,
                    row.list_appearances()
                );
            }
        }

        rows.push(row);
    }

    let years = columns.years.iter().map(|&(_, year)| year).collect();
    Ok(SongMatrix::from_parts(years, rows)?)
}
