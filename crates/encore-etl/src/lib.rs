//! Ingestion and export for encore.
//!
//! Fetches yearly playlists from the catalog API, keeps the raw tracklist
//! and processed matrix as CSV snapshots, and runs the fetch → process
//! pipeline over them.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod tables;

pub use catalog::{collect_tracklist, PlaylistSource, SpotifyClient};
pub use config::Config;
pub use error::{EtlError, EtlResult};
pub use pipeline::{fetch_playlists, load_matrix, process_data, SnapshotPaths, StepOutcome};
