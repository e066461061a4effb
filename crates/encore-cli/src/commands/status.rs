use anyhow::Result;
use encore_etl::tables;
use encore_etl::{config, Config};
use std::collections::BTreeSet;

pub fn show_status(config: &Config) -> Result<()> {
    let paths = config.snapshot_paths();
    let playlists = config.playlist_ids();

    println!("\n📊 Encore Status\n");
    println!("  Config file: {}", config::config_file_path().display());
    println!("  Data directory: {}", config.data_dir.display());
    println!(
        "  Credentials: {}",
        if config.credentials().is_some() { "set" } else { "not set" }
    );
    println!(
        "  Playlists: {} configured{}",
        playlists.len(),
        year_range(playlists.keys().copied())
    );

    println!();
    if paths.raw.exists() {
        match tables::read_tracklist(&paths.raw) {
            Ok(records) => println!(
                "  Raw data: {} tracks{} ({})",
                records.len(),
                year_range(records.iter().map(|r| r.year)),
                paths.raw.display()
            ),
            Err(e) => println!("  Raw data: unreadable ({e})"),
        }
    } else {
        println!("  Raw data: missing ({})", paths.raw.display());
    }

    if paths.processed.exists() {
        match tables::read_matrix(&paths.processed) {
            Ok(matrix) => println!(
                "  Processed data: {} unique songs{} ({})",
                matrix.len(),
                year_range(matrix.years().iter().copied()),
                paths.processed.display()
            ),
            Err(e) => println!("  Processed data: unreadable ({e})"),
        }
    } else {
        println!("  Processed data: missing ({})", paths.processed.display());
    }

    if !paths.raw.exists() {
        println!("\n  Run `encore fetch` to download the playlists");
    } else if !paths.processed.exists() {
        println!("\n  Run `encore process` to build the song matrix");
    }

    Ok(())
}

/// ` over N years (first-last)`, or nothing when there are no years.
fn year_range(years: impl Iterator<Item = i32>) -> String {
    let years: BTreeSet<i32> = years.collect();
    match (years.first(), years.last()) {
        (Some(first), Some(last)) => format!(" over {} years ({first}-{last})", years.len()),
        _ => String::new(),
    }
}
