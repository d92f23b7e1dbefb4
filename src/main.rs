mod batch;
mod clean;
mod config;
mod driver;
mod extract;
mod matcher;
mod merge;
mod model;
mod place;
mod seeds;
mod snapshot;
mod text;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::batch::{run_batch, BatchOptions};
use crate::config::Settings;
use crate::driver::{PageDriver, WebDriverSession};
use crate::place::PlaceScraper;

#[derive(Parser)]
#[command(name = "place_scraper", about = "Map listing scraper driven through WebDriver")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape a range of seeds from a CSV into a JSON shard
    Run {
        /// Seed CSV (place_id,name,address,lat,lon,type)
        #[arg(short, long)]
        input: PathBuf,
        /// Output JSON (default: derived from the input name and range)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// First seed index (inclusive)
        #[arg(long, default_value = "0")]
        start: usize,
        /// Last seed index (exclusive; default: end of file)
        #[arg(long)]
        end: Option<usize>,
        /// Reviews to keep per place
        #[arg(short = 'n', long)]
        reviews: Option<usize>,
        /// Show the browser window
        #[arg(long)]
        visible: bool,
    },
    /// Merge JSON shards, keeping the first record per place_id
    Merge {
        /// Directory holding the shards
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
        /// File name pattern (* and ? wildcards)
        #[arg(short, long, default_value = merge::DEFAULT_PATTERN)]
        pattern: String,
        /// Output file (default: <dir>/merged.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            input,
            output,
            start,
            end,
            reviews,
            visible,
        } => {
            let mut settings = Settings::load()?;
            if let Some(n) = reviews {
                settings.reviews_per_place = n;
            }
            if visible {
                settings.headless = false;
            }

            let output = output.unwrap_or_else(|| seeds::default_output_path(&input, start, end));
            info!("Input: {}", input.display());
            info!("Output: {}", output.display());
            info!(
                "Range: {} -> {}",
                start,
                end.map_or_else(|| "END".to_string(), |e| e.to_string())
            );

            let all = seeds::load_seeds(&input)?;
            let selected = seeds::select_range(all, start, end);
            info!("Loaded {} places", selected.len());

            let session = WebDriverSession::start(&settings)
                .with_context(|| format!("Could not start a browser session at {}", settings.webdriver_url))?;
            let opts = BatchOptions {
                output,
                offset: start,
                checkpoint_interval: settings.checkpoint_interval,
            };
            let mut scraper = PlaceScraper::new(session, settings);
            let outcome = run_batch(&mut scraper, &selected, &opts);

            let mut session = scraper.into_driver();
            if let Err(e) = session.quit() {
                warn!("Browser session did not close cleanly: {}", e);
            }
            outcome.map(|stats| {
                println!(
                    "Done: {}/{} places ({} errors) -> {}",
                    stats.ok,
                    stats.total,
                    stats.errors,
                    opts.output.display()
                );
            })
        }
        Commands::Merge { dir, pattern, output } => {
            match merge::merge_shards(&dir, &pattern, output.as_deref())? {
                Some(stats) => println!(
                    "Merged {} files: {} records, {} unique.",
                    stats.files, stats.records, stats.unique
                ),
                None => println!("No files found."),
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
