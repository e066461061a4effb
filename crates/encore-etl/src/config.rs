use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use encore_core::analysis::{DEFAULT_DREAM_RUN_THRESHOLD, DEFAULT_MIN_CONSECUTIVE};
use encore_core::Year;

use crate::catalog::Credentials;
use crate::pipeline::SnapshotPaths;

/// Prefix of the legacy per-year playlist variables, e.g. `pl_2019=<id>`.
const LEGACY_PLAYLIST_PREFIX: &str = "pl_";
const LEGACY_CLIENT_ID_VAR: &str = "SPOTIPY_CLIENT_ID";
const LEGACY_CLIENT_SECRET_VAR: &str = "SPOTIPY_CLIENT_SECRET";

/// Configuration for encore.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (ENCORE_* prefix, then legacy `pl_<year>` and
///    `SPOTIPY_*` variables)
/// 3. Config file (~/.config/encore/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Catalog API client ID.
    ///
    /// Can be set via:
    /// - ENV: ENCORE_CLIENT_ID (or SPOTIPY_CLIENT_ID)
    /// - Config: client_id = "..."
    pub client_id: Option<String>,

    /// Catalog API client secret.
    ///
    /// Can be set via:
    /// - ENV: ENCORE_CLIENT_SECRET (or SPOTIPY_CLIENT_SECRET)
    /// - Config: client_secret = "..."
    pub client_secret: Option<String>,

    /// Directory holding the raw and processed snapshots.
    ///
    /// Can be set via:
    /// - CLI: --data-dir /path
    /// - ENV: ENCORE_DATA_DIR
    /// - Default: ~/.local/share/encore
    pub data_dir: PathBuf,

    /// File name of the raw tracklist snapshot inside `data_dir`.
    pub raw_file_name: String,

    /// File name of the processed matrix snapshot inside `data_dir`.
    pub processed_file_name: String,

    /// Playlist ID per year, keyed by the year as a string.
    pub playlists: BTreeMap<String, String>,

    pub analysis: AnalysisSettings,

    pub logging: twyg::Opts,
}

/// Default thresholds for the analysis reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Top-N band for dream runs.
    pub dream_run_threshold: u32,
    /// Minimum consecutive years for an active streak.
    pub min_consecutive: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            dream_run_threshold: DEFAULT_DREAM_RUN_THRESHOLD,
            min_consecutive: DEFAULT_MIN_CONSECUTIVE,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            data_dir: default_data_dir(),
            raw_file_name: String::from("list.csv"),
            processed_file_name: String::from("working.csv"),
            playlists: BTreeMap::new(),
            analysis: AnalysisSettings::default(),
            logging: twyg::Opts::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/encore/config.toml
    /// Reads environment variables with ENCORE_ prefix, then the legacy
    /// variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("encore");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let mut config: Self = builder.build().context("Failed to build configuration")?;
        config.apply_legacy_env(std::env::vars());

        Ok(config)
    }

    /// Load configuration with a custom data directory.
    ///
    /// This is used when the --data-dir CLI flag is provided.
    pub fn load_with_data_dir(data_dir: PathBuf) -> Result<Self> {
        let mut config = Self::load()?;
        config.data_dir = data_dir;
        Ok(config)
    }

    /// Merge legacy variables: `pl_<year>=<id>` entries override configured
    /// playlists for that year, and `SPOTIPY_CLIENT_*` fill in credentials
    /// that are otherwise unset.
    pub fn apply_legacy_env<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(year) = key.strip_prefix(LEGACY_PLAYLIST_PREFIX) {
                self.playlists.insert(year.to_string(), value);
            } else if key == LEGACY_CLIENT_ID_VAR && is_blank(self.client_id.as_deref()) {
                self.client_id = Some(value);
            } else if key == LEGACY_CLIENT_SECRET_VAR && is_blank(self.client_secret.as_deref()) {
                self.client_secret = Some(value);
            }
        }
    }

    /// Configured playlists by year. Entries whose key is not a year are
    /// skipped with a warning.
    pub fn playlist_ids(&self) -> BTreeMap<Year, String> {
        self.playlists
            .iter()
            .filter_map(|(key, id)| match key.trim().parse::<Year>() {
                Ok(year) => Some((year, id.clone())),
                Err(_) => {
                    log::warn!("Ignoring playlist entry {key:?}: not a year");
                    None
                }
            })
            .collect()
    }

    /// Catalog credentials, if both halves are set and non-blank.
    pub fn credentials(&self) -> Option<Credentials> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) if !id.trim().is_empty() && !secret.trim().is_empty() => {
                Some(Credentials::new(id, secret))
            }
            _ => None,
        }
    }

    pub fn snapshot_paths(&self) -> SnapshotPaths {
        SnapshotPaths {
            raw: self.data_dir.join(&self.raw_file_name),
            processed: self.data_dir.join(&self.processed_file_name),
        }
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Get the default snapshot directory.
///
/// Returns: ~/.local/share/encore (or platform equivalent)
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("encore")
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/encore/config.toml
/// - macOS: ~/Library/Application Support/encore/config.toml
/// - Windows: %APPDATA%\encore\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("encore")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Encore Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (ENCORE_* prefix, then pl_<year> / SPOTIPY_*)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Spotify API client credentials (client-credentials grant)
#
# Create an app at: https://developer.spotify.com/dashboard
#
# Can also be set via:
# - Environment: ENCORE_CLIENT_ID / ENCORE_CLIENT_SECRET
# - Environment: SPOTIPY_CLIENT_ID / SPOTIPY_CLIENT_SECRET
client_id = "your-client-id-here"
client_secret = "your-client-secret-here"

# Directory for the raw (list.csv) and processed (working.csv) snapshots
#
# Can also be set via:
# - CLI: encore --data-dir /custom/path process
# - Environment: ENCORE_DATA_DIR=/custom/path
#
# Default: Platform-specific data directory
#data_dir = "/path/to/encore/data"

#raw_file_name = "list.csv"
#processed_file_name = "working.csv"

# One public playlist per year
#
# Can also be set via environment variables of the form pl_2019=<id>
[playlists]
#2018 = "37i9dQZF1Ejxxxxxxxxxxxxx"
#2019 = "37i9dQZF1Eyxxxxxxxxxxxxx"

[analysis]
# Top-N band for "dream runs"
dream_run_threshold = 10
# Minimum consecutive years for an active streak
min_consecutive = 3
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
