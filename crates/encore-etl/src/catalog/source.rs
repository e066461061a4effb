//! The [`PlaylistSource`] seam and flattening playlists into
//! [`TrackRecord`]s.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

use encore_core::{Rank, TrackRecord, Year};

use crate::error::EtlResult;

/// A playlist as fetched from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub owner: Option<String>,
    pub description: Option<String>,
    pub public: Option<bool>,
    pub collaborative: bool,
    pub url: Option<String>,
    /// Track count reported by the catalog.
    pub total_tracks: u32,
    /// Entries in playlist order. `None` marks a track that was removed
    /// from the catalog but still holds its slot.
    pub entries: Vec<Option<PlaylistTrack>>,
}

/// One track entry of a [`Playlist`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistTrack {
    /// Catalog ID; local files have none.
    pub id: Option<String>,
    pub name: String,
    pub artists: Vec<String>,
    pub link: Option<String>,
}

/// Anything that can resolve a playlist ID to its contents.
#[async_trait]
pub trait PlaylistSource: Send + Sync {
    async fn playlist(&self, playlist_id: &str) -> EtlResult<Playlist>;
}

/// Flatten one year's playlist into records ranked by position.
///
/// Removed tracks are skipped but still consume their rank.
pub fn playlist_records(year: Year, playlist: &Playlist) -> Vec<TrackRecord> {
    playlist
        .entries
        .iter()
        .zip(1u32..)
        .filter_map(|(entry, position)| {
            let Some(track) = entry else {
                log::warn!("Skipping deleted track at rank {} in {}", position, year);
                return None;
            };
            let rank = Rank::new(position)?;
            Some(
                TrackRecord::new(year, rank, track.name.clone(), track.artists.clone())
                    .with_external_id(track.id.clone().unwrap_or_default())
                    .with_link(track.link.clone().unwrap_or_default()),
            )
        })
        .collect()
}

/// Fetch every configured playlist and flatten them into one tracklist.
///
/// Years are fetched in ascending order. A playlist that cannot be loaded
/// (missing, private, network failure after retries) is logged and skipped;
/// the remaining years are still collected.
pub async fn collect_tracklist<S>(source: &S, playlists: &BTreeMap<Year, String>) -> Vec<TrackRecord>
where
    S: PlaylistSource + ?Sized,
{
    let mut records = Vec::new();

    for (&year, playlist_id) in playlists {
        let playlist = match source.playlist(playlist_id).await {
            Ok(playlist) => playlist,
            Err(e) => {
                log::error!(
                    "Failed to load playlist for {} (ID: {}). Ensure the playlist is public. Error: {}",
                    year,
                    playlist_id,
                    e
                );
                continue;
            }
        };

        let year_records = playlist_records(year, &playlist);
        log::info!(
            "Loaded playlist '{}' for {}: {} tracks found",
            playlist.name,
            year,
            year_records.len()
        );
        records.extend(year_records);
    }

    log::info!("Total tracks fetched: {}", records.len());
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EtlError;
    use std::collections::HashMap;

    fn track(name: &str, artist: &str) -> Option<PlaylistTrack> {
        Some(PlaylistTrack {
            id: Some(format!("{name}-id")),
            name: name.to_string(),
            artists: vec![artist.to_string()],
            link: Some(format!("https://open.spotify.com/track/{name}-id")),
        })
    }

    fn playlist(id: &str, entries: Vec<Option<PlaylistTrack>>) -> Playlist {
        let total_tracks = u32::try_from(entries.len()).unwrap();
        Playlist {
            id: id.to_string(),
            name: format!("Your Top Songs {id}"),
            owner: Some("Spotify".to_string()),
            description: None,
            public: Some(true),
            collaborative: false,
            url: None,
            total_tracks,
            entries,
        }
    }

    #[derive(Debug, Default)]
    struct FakeSource {
        playlists: HashMap<String, Playlist>,
    }

    #[async_trait]
    impl PlaylistSource for FakeSource {
        async fn playlist(&self, playlist_id: &str) -> EtlResult<Playlist> {
            self.playlists
                .get(playlist_id)
                .cloned()
                .ok_or_else(|| EtlError::NotFound {
                    entity: format!("playlist {playlist_id}"),
                    source_name: "fake".to_string(),
                })
        }
    }

    #[test]
    fn test_playlist_records_ranks_by_position() {
        let list = playlist("p", vec![track("One", "A"), None, track("Three", "C")]);
        let records = playlist_records(2021, &list);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].rank.get(), 1);
        assert_eq!(records[0].name, "One");
        assert_eq!(records[0].external_id, "One-id");
        // The deleted track still holds rank 2.
        assert_eq!(records[1].rank.get(), 3);
        assert_eq!(records[1].year, 2021);
    }

    #[test]
    fn test_playlist_records_local_track_without_id() {
        let mut local = track("Local", "Me");
        if let Some(t) = local.as_mut() {
            t.id = None;
            t.link = None;
        }
        let records = playlist_records(2020, &playlist("p", vec![local]));
        assert_eq!(records[0].external_id, "");
        assert_eq!(records[0].link, "");
    }

    #[tokio::test]
    async fn test_collect_tracklist_skips_failed_years() {
        let mut source = FakeSource::default();
        source
            .playlists
            .insert("p2018".to_string(), playlist("p2018", vec![track("Old", "A")]));
        source.playlists.insert(
            "p2020".to_string(),
            playlist("p2020", vec![track("New", "B"), track("Newer", "C")]),
        );

        let mut ids = BTreeMap::new();
        ids.insert(2020, "p2020".to_string());
        ids.insert(2018, "p2018".to_string());
        ids.insert(2019, "private".to_string());

        let records = collect_tracklist(&source, &ids).await;
        let years: Vec<Year> = records.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2018, 2020, 2020]);
    }

    #[tokio::test]
    async fn test_collect_tracklist_nothing_configured() {
        let source = FakeSource::default();
        let records = collect_tracklist(&source, &BTreeMap::new()).await;
        assert!(records.is_empty());
    }
}
