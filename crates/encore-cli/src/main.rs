use anyhow::{Context, Result};
use clap::Parser;
use encore_etl::Config;
use std::path::PathBuf;

mod commands;

use commands::analyze::{AnalyzeOptions, Report};

#[derive(Debug, Parser)]
#[command(name = "encore", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory for the raw and processed snapshots (default: ~/.local/share/encore)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Fetch the configured yearly playlists into the raw snapshot
    ///
    /// Each configured year's playlist is loaded from Spotify with the
    /// client-credentials grant and flattened into one row per track:
    ///
    /// - Rank is the 1-based position in the playlist
    /// - Tracks removed from the catalog are skipped but keep their rank
    /// - Playlists that cannot be loaded (missing, private) are skipped
    ///
    /// Playlists come from the [playlists] table of the config file or from
    /// pl_<year>=<id> environment variables.
    ///
    /// The step is skipped if the raw snapshot already exists, unless
    /// --force is given. If nothing at all is fetched, no snapshot is
    /// written.
    Fetch {
        /// Fetch again even if the raw snapshot exists
        #[arg(long)]
        force: bool,
    },
    /// Deduplicate songs and build the year-by-year rank matrix
    ///
    /// Songs are identified by their title and artist set, ignoring case
    /// and artist order, so the same song listed under different catalog
    /// IDs in different years becomes one row. Each row carries the rank
    /// per year (0 when not listed), the number of appearances and a score
    /// of 101 - rank summed over listed years.
    ///
    /// Fetches first if the raw snapshot does not exist yet.
    Process {
        /// Rebuild even if the processed snapshot exists
        #[arg(long)]
        force: bool,
    },
    /// Run analysis reports over the processed snapshot
    Analyze {
        /// Report to show
        #[arg(value_enum, default_value_t = Report::All)]
        report: Report,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Top-N band for dream runs (default from config)
        #[arg(long)]
        threshold: Option<u32>,

        /// Minimum consecutive years for a streak (default from config)
        #[arg(long)]
        min_consecutive: Option<usize>,
    },
    /// Show details of a playlist
    Playlist {
        /// Spotify playlist ID
        id: String,
    },
    /// Show snapshot and configuration status
    Status,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the current effective configuration
    Show,
    /// Show the config file path
    Path,
    /// Print an example configuration
    Example,
    /// Create the config file with defaults
    Init,
    /// Get a config value (or the whole file)
    Get {
        /// Key, e.g. client_id, analysis.dream_run_threshold or playlists.2019
        key: Option<String>,
    },
    /// Set a config value
    Set {
        /// Key, e.g. client_id, analysis.dream_run_threshold or playlists.2019
        key: String,
        /// Value to store
        value: String,
    },
}

fn load_config(data_dir: Option<PathBuf>) -> Result<Config> {
    match data_dir {
        Some(dir) => Config::load_with_data_dir(dir),
        None => Config::load(),
    }
    .context("Failed to load configuration")
}

fn init_logging(config: &Config) -> Result<()> {
    twyg::setup(config.logging.clone())
        .map_err(|e| anyhow::anyhow!("Failed to set up logging: {e}"))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config management must work even when the config file is broken.
    if let Commands::Config { action } = cli.command {
        return match action {
            ConfigAction::Show => commands::config::show_config(),
            ConfigAction::Path => commands::config::show_path(),
            ConfigAction::Example => commands::config::show_example(),
            ConfigAction::Init => commands::config::init_config(),
            ConfigAction::Get { key } => commands::config::get_config(key),
            ConfigAction::Set { key, value } => commands::config::set_config(&key, &value),
        };
    }

    let config = load_config(cli.data_dir)?;
    init_logging(&config)?;

    match cli.command {
        Commands::Fetch { force } => {
            commands::run_fetch(&config, force).await?;
        }
        Commands::Process { force } => {
            commands::run_process(&config, force).await?;
        }
        Commands::Analyze {
            report,
            json,
            threshold,
            min_consecutive,
        } => {
            let options = AnalyzeOptions {
                report,
                json,
                threshold: threshold.unwrap_or(config.analysis.dream_run_threshold),
                min_consecutive: min_consecutive.unwrap_or(config.analysis.min_consecutive),
            };
            commands::run_analyze(&config, &options).await?;
        }
        Commands::Playlist { id } => {
            commands::show_playlist(&config, &id).await?;
        }
        Commands::Status => {
            commands::show_status(&config)?;
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_analyze_args() {
        let cli = Cli::try_parse_from(["encore", "analyze", "dream-runs", "--threshold", "5", "--json"]).unwrap();
        match cli.command {
            Commands::Analyze {
                report,
                json,
                threshold,
                min_consecutive,
            } => {
                assert_eq!(report, Report::DreamRuns);
                assert!(json);
                assert_eq!(threshold, Some(5));
                assert_eq!(min_consecutive, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_analyze_defaults_to_all() {
        let cli = Cli::try_parse_from(["encore", "--data-dir", "/tmp/x", "analyze"]).unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
        assert!(matches!(
            cli.command,
            Commands::Analyze {
                report: Report::All,
                ..
            }
        ));
    }
}
