use thiserror::Error;

use crate::model::{SongId, Year};

/// A playlist entry whose name or artists cannot produce a song identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("track name is empty")]
    MissingName,

    #[error("track has no artists")]
    NoArtists,

    #[error("artist at position {position} is empty")]
    BlankArtist { position: usize },
}

/// The record set as a whole cannot be pivoted into a matrix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatrixBuildError {
    #[error("no valid records to build a matrix from ({dropped} dropped as malformed)")]
    NoValidRecords { dropped: usize },

    #[error("matrix years must be strictly ascending")]
    UnsortedYears,

    #[error("song {song_id} has a rank for {year}, which is not a matrix year")]
    UnknownYear { song_id: SongId, year: Year },
}

/// An analysis was asked of a matrix it is not defined for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("cannot analyze an empty matrix")]
    EmptyMatrix,

    #[error("{operation} needs at least {required} years of data, found {found}")]
    InsufficientYears {
        operation: &'static str,
        required: usize,
        found: usize,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("matrix error: {0}")]
    MatrixBuild(#[from] MatrixBuildError),

    #[error("analysis error: {0}")]
    Analysis(#[from] AnalysisError),
}

pub type Result<T> = std::result::Result<T, Error>;
