use anyhow::{Context, Result};
use encore_etl::Config;

use super::fetch::catalog_client;

/// Number of tracks listed by `encore playlist`.
const PREVIEW_TRACKS: usize = 10;

/// Show a playlist's details and its first tracks.
pub async fn show_playlist(config: &Config, playlist_id: &str) -> Result<()> {
    let client = catalog_client(config)?;
    let playlist = client
        .fetch_playlist(playlist_id)
        .await
        .with_context(|| format!("Failed to load playlist {playlist_id}"))?;

    let visibility = match playlist.public {
        Some(true) => "public",
        Some(false) => "private",
        None => "unknown",
    };

    println!("\n🎶 {}\n", playlist.name);
    println!("  ID:            {}", playlist.id);
    println!("  Owner:         {}", playlist.owner.as_deref().unwrap_or("<unknown>"));
    println!("  Description:   {}", playlist.description.as_deref().unwrap_or("<none>"));
    println!("  Total tracks:  {}", playlist.total_tracks);
    println!("  Visibility:    {}", visibility);
    println!("  Collaborative: {}", if playlist.collaborative { "yes" } else { "no" });
    if let Some(url) = &playlist.url {
        println!("  URL:           {}", url);
    }

    println!("\n  First {} tracks:", PREVIEW_TRACKS.min(playlist.entries.len()));
    for (position, entry) in playlist.entries.iter().take(PREVIEW_TRACKS).enumerate() {
        match entry {
            Some(track) => println!(
                "  {:>3}. {} - {}",
                position + 1,
                track.name,
                track.artists.join(", ")
            ),
            None => println!("  {:>3}. <removed from catalog>", position + 1),
        }
    }

    Ok(())
}
