//! Core domain model for encore.
//!
//! This crate turns yearly ranked playlist entries into a deduplicated
//! year-by-rank matrix and runs trend analyses over it. It performs no I/O:
//! records come in as plain values and results go out the same way.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod analysis;
pub mod error;
pub mod identity;
pub mod matrix;
pub mod model;

pub use analysis::TrendAnalyzer;
pub use error::{AnalysisError, Error, IdentityError, MatrixBuildError, Result};
pub use identity::compute_identity;
pub use matrix::{build_matrix, SongMatrix};
pub use model::{Rank, SongId, SongRow, TrackRecord, Year};
