pub mod ids;
pub mod rank;
pub mod song;
pub mod track;

pub use ids::SongId;
pub use rank::{Rank, Year};
pub use song::SongRow;
pub use track::TrackRecord;
