use anyhow::{Context, Result};
use encore_etl::{process_data, Config, StepOutcome};

/// Build the processed matrix snapshot, fetching first if needed.
///
/// Steps:
/// 1. Fetch - only when the raw snapshot does not exist yet
/// 2. Process - deduplicate songs and pivot ranks by year
pub async fn run_process(config: &Config, force: bool) -> Result<StepOutcome> {
    let paths = config.snapshot_paths();

    if !paths.raw.exists() {
        println!("📥 Step 1/2: No raw data found, fetching first...");
        let fetched = super::run_fetch(config, false)
            .await
            .context("Fetch step failed")?;
        if fetched == StepOutcome::NothingFetched {
            anyhow::bail!("Nothing to process: no tracks were fetched");
        }
        println!();
    } else {
        println!("📥 Step 1/2: Fetch (skipped - raw data present)");
    }

    println!("🔧 Step 2/2: Processing {}...", paths.raw.display());
    let outcome = process_data(&paths, force).context("Process step failed")?;

    match outcome {
        StepOutcome::Completed { rows } => {
            println!("  ✓ {} unique songs saved to {}", rows, paths.processed.display());
            println!("\nNext steps:");
            println!("  - Run 'encore analyze' to see the reports");
        }
        StepOutcome::Skipped => {
            println!("  Processed data already exists: {}", paths.processed.display());
            println!("  (use --force to rebuild)");
        }
        StepOutcome::NothingFetched => {}
    }

    Ok(outcome)
}
