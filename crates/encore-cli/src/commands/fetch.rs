use anyhow::{Context, Result};
use encore_etl::{fetch_playlists, Config, EtlError, SpotifyClient, StepOutcome};

/// Build a Spotify client from the configured credentials.
pub fn catalog_client(config: &Config) -> Result<SpotifyClient> {
    let credentials = config.credentials().ok_or(EtlError::MissingCredentials)?;
    SpotifyClient::new(credentials).context("Failed to create Spotify client")
}

/// Fetch every configured playlist into the raw snapshot.
pub async fn run_fetch(config: &Config, force: bool) -> Result<StepOutcome> {
    let paths = config.snapshot_paths();

    if !force && paths.raw.exists() {
        println!("Raw data already exists: {}", paths.raw.display());
        println!("  (use --force to fetch again)");
        return Ok(StepOutcome::Skipped);
    }

    let playlists = config.playlist_ids();
    let client = catalog_client(config)?;

    println!("\nFetching {} playlists...", playlists.len());
    for (year, id) in &playlists {
        println!("  {year}: {id}");
    }

    let outcome = fetch_playlists(&client, &playlists, &paths, force)
        .await
        .context("Fetch step failed")?;

    match outcome {
        StepOutcome::Completed { rows } => {
            println!("\n✓ Saved {} tracks to {}", rows, paths.raw.display());
        }
        StepOutcome::NothingFetched => {
            println!("\nNo tracks fetched; nothing was written.");
            println!("  Check that the playlists are public and the IDs are correct.");
        }
        StepOutcome::Skipped => {
            println!("Raw data already exists: {}", paths.raw.display());
        }
    }

    Ok(outcome)
}
