//! The fetch → process pipeline over the two CSV snapshots.
//!
//! Each step skips when its output already exists unless forced, so an
//! interrupted run resumes where it stopped.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use encore_core::{build_matrix, SongMatrix, Year};

use crate::catalog::{collect_tracklist, PlaylistSource};
use crate::error::{EtlError, EtlResult};
use crate::tables;

/// Locations of the raw tracklist and processed matrix snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPaths {
    pub raw: PathBuf,
    pub processed: PathBuf,
}

impl SnapshotPaths {
    /// Snapshots with their usual names (`list.csv`, `working.csv`) in `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            raw: dir.join("list.csv"),
            processed: dir.join("working.csv"),
        }
    }
}

/// What a pipeline step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The output was written with this many rows.
    Completed { rows: usize },
    /// The output already existed and was left alone.
    Skipped,
    /// Nothing was fetched, so nothing was written.
    NothingFetched,
}

/// Fetch every configured playlist and write the raw tracklist snapshot.
///
/// Playlists that fail to load are skipped. When no track at all was
/// fetched, the snapshot is not written.
///
/// # Errors
/// Returns [`EtlError::NoPlaylists`] if `playlists` is empty, or an error
/// if the snapshot cannot be written.
pub async fn fetch_playlists<S>(
    source: &S,
    playlists: &BTreeMap<Year, String>,
    paths: &SnapshotPaths,
    force: bool,
) -> EtlResult<StepOutcome>
where
    S: PlaylistSource + ?Sized,
{
    if !force && paths.raw.exists() {
        log::info!("Raw data already exists at {}, skipping fetch", paths.raw.display());
        return Ok(StepOutcome::Skipped);
    }
    if playlists.is_empty() {
        return Err(EtlError::NoPlaylists);
    }

    log::info!("Fetching {} playlists", playlists.len());
    let records = collect_tracklist(source, playlists).await;
    if records.is_empty() {
        log::warn!("No tracks fetched; {} was not written", paths.raw.display());
        return Ok(StepOutcome::NothingFetched);
    }

    prepare_parent(&paths.raw)?;
    tables::write_tracklist(&paths.raw, &records)?;
    Ok(StepOutcome::Completed {
        rows: records.len(),
    })
}

/// Build the song matrix from the raw snapshot and write the processed
/// snapshot.
///
/// # Errors
/// Returns [`EtlError::MissingSnapshot`] if the raw snapshot does not
/// exist, or an error if it cannot be read, pivoted, or written.
pub fn process_data(paths: &SnapshotPaths, force: bool) -> EtlResult<StepOutcome> {
    if !force && paths.processed.exists() {
        log::info!(
            "Processed data already exists at {}, skipping processing",
            paths.processed.display()
        );
        return Ok(StepOutcome::Skipped);
    }
    if !paths.raw.exists() {
        return Err(EtlError::MissingSnapshot {
            path: paths.raw.clone(),
        });
    }

    let records = tables::read_tracklist(&paths.raw)?;
    let matrix = build_matrix(&records)?;
    log::info!("Processing complete: {} unique songs", matrix.len());

    prepare_parent(&paths.processed)?;
    tables::write_matrix(&paths.processed, &matrix)?;
    Ok(StepOutcome::Completed { rows: matrix.len() })
}

/// Load the processed snapshot for analysis.
///
/// # Errors
/// Returns [`EtlError::MissingSnapshot`] if it has not been written yet.
pub fn load_matrix(paths: &SnapshotPaths) -> EtlResult<SongMatrix> {
    if !paths.processed.exists() {
        return Err(EtlError::MissingSnapshot {
            path: paths.processed.clone(),
        });
    }
    let matrix = tables::read_matrix(&paths.processed)?;
    log::debug!(
        "Loaded {} songs over {} years from {}",
        matrix.len(),
        matrix.years().len(),
        paths.processed.display()
    );
    Ok(matrix)
}

fn prepare_parent(path: &Path) -> EtlResult<()> {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    if parent.exists() && !parent.is_dir() {
        return Err(EtlError::Config(format!(
            "data directory {} is not a directory",
            parent.display()
        )));
    }
    std::fs::create_dir_all(parent)?;
    Ok(())
}
