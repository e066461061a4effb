use anyhow::{Context, Result};
use encore_etl::{config, Config};
use toml_edit::{value, DocumentMut};

const VALID_KEYS: &str = "client_id, client_secret, data_dir, raw_file_name, processed_file_name, \
                          analysis.dream_run_threshold, analysis.min_consecutive, playlists.<year>";

/// Show the current effective configuration.
pub fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("Current Configuration");
    println!("=====================\n");

    println!("Config file: {}", config::config_file_path().display());

    let exists = config::config_file_path().exists();
    println!("File exists: {}\n", if exists { "yes" } else { "no (using defaults)" });

    println!("Settings:");
    println!("  client_id: {}", config.client_id.as_deref().unwrap_or("<not set>"));
    println!(
        "  client_secret: {}",
        if config.client_secret.is_some() { "<set>" } else { "<not set>" }
    );
    println!("  data_dir: {}", config.data_dir.display());
    println!("  raw_file_name: {}", config.raw_file_name);
    println!("  processed_file_name: {}", config.processed_file_name);
    println!("  analysis.dream_run_threshold: {}", config.analysis.dream_run_threshold);
    println!("  analysis.min_consecutive: {}", config.analysis.min_consecutive);
    println!("  logging.level: {:?}", config.logging.level());
    println!("  logging.coloured: {}", config.logging.coloured());
    println!("  logging.output: {:?}", config.logging.output());

    let playlists = config.playlist_ids();
    println!("  playlists: {}", if playlists.is_empty() { "<none>" } else { "" });
    for (year, id) in &playlists {
        println!("    {year} = {id}");
    }

    println!("\nPriority: CLI args > ENV vars (ENCORE_*, pl_<year>, SPOTIPY_*) > Config file > Defaults");

    Ok(())
}

/// Get a specific config value.
pub fn get_config(key: Option<String>) -> Result<()> {
    let Some(key) = key else {
        // No key provided, show entire config file contents
        let config_path = config::config_file_path();

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).context("Failed to read config file")?;
            print!("{}", contents);
        } else {
            println!("Config file does not exist: {}", config_path.display());
            println!("\nRun 'encore config init' to create it.");
        }
        return Ok(());
    };

    let config = Config::load()?;
    let not_set = || String::from("<not set>");

    let shown = match key.as_str() {
        "client_id" => config.client_id.unwrap_or_else(not_set),
        "client_secret" => config.client_secret.unwrap_or_else(not_set),
        "data_dir" => config.data_dir.display().to_string(),
        "raw_file_name" => config.raw_file_name,
        "processed_file_name" => config.processed_file_name,
        "analysis.dream_run_threshold" => config.analysis.dream_run_threshold.to_string(),
        "analysis.min_consecutive" => config.analysis.min_consecutive.to_string(),
        other => match other.strip_prefix("playlists.") {
            Some(year) => config.playlists.get(year).cloned().unwrap_or_else(not_set),
            None => anyhow::bail!("Unknown config key: {}\n\nValid keys: {}", key, VALID_KEYS),
        },
    };
    println!("{}", shown);

    Ok(())
}

/// Set `key` to `raw` in a TOML document, keeping comments and layout.
fn set_key_in(contents: &str, key: &str, raw: &str) -> Result<String> {
    let mut doc = contents
        .parse::<DocumentMut>()
        .context("Failed to parse config file")?;

    match key {
        "client_id" | "client_secret" | "data_dir" | "raw_file_name" | "processed_file_name" => {
            doc[key] = value(raw);
        }
        "analysis.dream_run_threshold" => {
            let threshold: u32 = raw
                .parse()
                .with_context(|| format!("{key} must be a positive integer"))?;
            doc["analysis"]["dream_run_threshold"] = value(i64::from(threshold));
        }
        "analysis.min_consecutive" => {
            let years: u32 = raw
                .parse()
                .with_context(|| format!("{key} must be a positive integer"))?;
            doc["analysis"]["min_consecutive"] = value(i64::from(years));
        }
        other => match other.strip_prefix("playlists.") {
            Some(year) if year.parse::<i32>().is_ok() => {
                doc["playlists"][year] = value(raw);
            }
            Some(year) => anyhow::bail!("Playlist key must be a year, got {:?}", year),
            None => anyhow::bail!("Unknown config key: {}\n\nValid keys: {}", key, VALID_KEYS),
        },
    }

    Ok(doc.to_string())
}

/// Set a config value.
pub fn set_config(key: &str, raw: &str) -> Result<()> {
    let config_path = config::config_file_path();

    // Ensure config file exists
    config::ensure_config_file()?;

    let contents = std::fs::read_to_string(&config_path).context("Failed to read config file")?;
    let updated = set_key_in(&contents, key, raw)?;
    std::fs::write(&config_path, updated).context("Failed to write config file")?;

    println!("✓ Updated {} = {}", key, raw);
    println!("  in {}", config_path.display());

    Ok(())
}

/// Show the config file path.
pub fn show_path() -> Result<()> {
    let config_path = config::config_file_path();
    println!("{}", config_path.display());
    Ok(())
}

/// Show example configuration.
pub fn show_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to add your Spotify credentials and playlists.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
