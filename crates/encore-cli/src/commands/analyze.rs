use anyhow::{Context, Result};
use encore_core::{SongRow, TrendAnalyzer};
use encore_etl::{load_matrix, Config};
use serde_json::Value;

/// Number of artists shown in the text report.
const TOP_ARTISTS: usize = 20;

/// Available analysis reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Report {
    /// Artists by number of distinct songs
    Artists,
    /// Top-band songs that vanished the next year
    DreamRuns,
    /// Songs that climbed or came back
    OnTheUp,
    /// What became of the first year's songs
    FirstToLast,
    /// Songs listed every year up to the latest
    Streaks,
    /// Songs listed in exactly one year
    OneTimers,
    /// Totals and top artist
    Summary,
    /// Every report
    All,
}

impl Report {
    const EACH: [Self; 7] = [
        Self::Summary,
        Self::Artists,
        Self::DreamRuns,
        Self::OnTheUp,
        Self::FirstToLast,
        Self::Streaks,
        Self::OneTimers,
    ];

    fn key(self) -> &'static str {
        match self {
            Self::Artists => "artists",
            Self::DreamRuns => "dream_runs",
            Self::OnTheUp => "on_the_up",
            Self::FirstToLast => "first_to_last",
            Self::Streaks => "streaks",
            Self::OneTimers => "one_timers",
            Self::Summary => "summary",
            Self::All => "all",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AnalyzeOptions {
    pub report: Report,
    pub json: bool,
    pub threshold: u32,
    pub min_consecutive: usize,
}

/// Run one or all reports over the processed snapshot.
///
/// In text mode a missing snapshot is built first; JSON mode keeps stdout
/// clean and asks for `encore process` instead. With `all`, a report that
/// cannot run (e.g. a single year of data) is skipped.
pub async fn run_analyze(config: &Config, options: &AnalyzeOptions) -> Result<()> {
    let paths = config.snapshot_paths();

    if !paths.processed.exists() {
        if options.json {
            anyhow::bail!(
                "No processed data at {}\n\nRun 'encore process' first.",
                paths.processed.display()
            );
        }
        super::run_process(config, false).await?;
        println!();
    }

    let matrix = load_matrix(&paths).context("Failed to load processed data")?;
    let analyzer = TrendAnalyzer::new(&matrix).context("Nothing to analyze")?;

    let reports: &[Report] = if options.report == Report::All {
        &Report::EACH
    } else {
        std::slice::from_ref(&options.report)
    };
    let skip_failures = options.report == Report::All;

    if options.json {
        let mut out = serde_json::Map::new();
        for &report in reports {
            match report_json(analyzer, report, options) {
                Ok(value) => {
                    out.insert(report.key().to_string(), value);
                }
                Err(e) if skip_failures => {
                    log::warn!("Skipping {}: {}", report.key(), e);
                    out.insert(report.key().to_string(), Value::Null);
                }
                Err(e) => return Err(e),
            }
        }
        let value = if skip_failures {
            Value::Object(out)
        } else {
            out.remove(options.report.key()).unwrap_or(Value::Null)
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    for &report in reports {
        match print_report(analyzer, report, options) {
            Ok(()) => {}
            Err(e) if skip_failures => println!("  (skipped: {e})\n"),
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

fn report_json(analyzer: TrendAnalyzer<'_>, report: Report, options: &AnalyzeOptions) -> Result<Value> {
    let value = match report {
        Report::Artists => serde_json::to_value(analyzer.most_popular_artists())?,
        Report::DreamRuns => serde_json::to_value(analyzer.one_year_dream_runs(options.threshold)?)?,
        Report::OnTheUp => serde_json::to_value(analyzer.on_the_up()?)?,
        Report::FirstToLast => serde_json::to_value(analyzer.first_to_last_time()?)?,
        Report::Streaks => serde_json::to_value(analyzer.active_streaks(options.min_consecutive)?)?,
        Report::OneTimers => serde_json::to_value(analyzer.one_timers())?,
        Report::Summary => serde_json::to_value(analyzer.summary_stats())?,
        Report::All => Value::Null,
    };
    Ok(value)
}

fn describe(song: &SongRow) -> String {
    if song.artists.is_empty() {
        song.name.clone()
    } else {
        format!("{} - {}", song.name, song.artists.join(", "))
    }
}

fn print_report(analyzer: TrendAnalyzer<'_>, report: Report, options: &AnalyzeOptions) -> Result<()> {
    match report {
        Report::Summary => {
            let stats = analyzer.summary_stats();
            println!("📊 Summary\n");
            println!("  Unique songs:     {}", stats.total_unique_songs);
            println!("  Total entries:    {}", stats.total_entries);
            println!("  Avg appearances:  {:.2}", stats.avg_appearances);
            println!(
                "  Years:            {}-{} ({} years)",
                stats.year_span.0, stats.year_span.1, stats.year_count
            );
            println!("  Top artist:       {}", stats.top_artist.as_deref().unwrap_or("N/A"));
        }
        Report::Artists => {
            let artists = analyzer.most_popular_artists();
            println!("🎤 Most popular artists (top {})\n", TOP_ARTISTS.min(artists.len()));
            for (position, stats) in artists.iter().take(TOP_ARTISTS).enumerate() {
                println!(
                    "  {:>2}. {:<32} {:>3} songs  {:>3} appearances  avg score {:>6.1}",
                    position + 1,
                    stats.artist,
                    stats.track_count,
                    stats.total_appearances,
                    stats.avg_score
                );
            }
        }
        Report::DreamRuns => {
            let runs = analyzer.one_year_dream_runs(options.threshold)?;
            println!("🌠 One-year dream runs (top {}, gone the next year)\n", options.threshold);
            if runs.is_empty() {
                println!("  none");
            }
            for run in &runs {
                println!(
                    "  {}  #{:<3} {}",
                    run.dream_year,
                    run.rank_in_dream_year,
                    describe(run.song)
                );
            }
        }
        Report::OnTheUp => {
            let recoveries = analyzer.on_the_up()?;
            println!("📈 On the up\n");
            if recoveries.is_empty() {
                println!("  none");
            }
            for recovery in &recoveries {
                let previous = recovery
                    .previous_rank
                    .map_or_else(|| String::from("off"), |rank| format!("#{rank}"));
                println!(
                    "  {}  {:<8} {:>4} -> #{:<3} {}",
                    recovery.recovery_year,
                    recovery.recovery_type,
                    previous,
                    recovery.new_rank,
                    describe(recovery.song)
                );
            }
        }
        Report::FirstToLast => {
            let comparison = analyzer.first_to_last_time()?;
            println!(
                "🔁 First year ({}) to last year ({})\n",
                comparison.first_year, comparison.last_year
            );
            println!("  Only in {}:        {}", comparison.first_year, comparison.first_year_only.len());
            println!("  Listed again later:  {}", comparison.persisted.len());
            println!(
                "  Still there in {}: {}",
                comparison.last_year,
                comparison.persisted_to_last.len()
            );
            for song in &comparison.persisted_to_last {
                println!("    {}", describe(song));
            }
        }
        Report::Streaks => {
            let streaks = analyzer.active_streaks(options.min_consecutive)?;
            println!("🔥 Active streaks ({}+ years)\n", options.min_consecutive);
            if streaks.is_empty() {
                println!("  none");
            }
            for streak in &streaks {
                println!(
                    "  {:>2} years since {}  {}",
                    streak.streak_length,
                    streak.streak_start_year,
                    describe(streak.song)
                );
            }
        }
        Report::OneTimers => {
            let one_timers = analyzer.one_timers();
            println!("☝️  One-timers ({})\n", one_timers.len());
            for one_timer in &one_timers {
                println!("  {}  {}", one_timer.appearance_year, describe(one_timer.song));
            }
        }
        Report::All => {}
    }
    println!();
    Ok(())
}
