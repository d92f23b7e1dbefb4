use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, warn};

use crate::model::{PlaceRecord, SeedRecord};
use crate::place::SeedScraper;

/// Counts returned after a batch run.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
    pub checkpoints: usize,
}

pub struct BatchOptions {
    pub output: PathBuf,
    /// Absolute index of the first seed, for progress messages only.
    pub offset: usize,
    pub checkpoint_interval: usize,
}

/// Scrape every seed in order, checkpointing the accumulated records to `opts.output`.
///
/// A seed whose scraper returns `Err` is logged and contributes nothing; it still
/// counts towards the checkpoint cadence. `PlaceScraper` never fails a seed: a page
/// that won't load still yields the seed's own fields. The file is rewritten at every checkpoint and once at the end.
pub fn run_batch(scraper: &mut dyn SeedScraper, seeds: &[SeedRecord], opts: &BatchOptions) -> Result<BatchStats> {
    let total = seeds.len();
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let mut records: Vec<PlaceRecord> = Vec::with_capacity(total);
    let mut stats = BatchStats {
        total,
        ok: 0,
        errors: 0,
        checkpoints: 0,
    };

    for (i, seed) in seeds.iter().enumerate() {
        let position = i + 1;
        info!("[{}/{}] {}", opts.offset + position, opts.offset + total, seed.name);

        match scraper.scrape(seed) {
            Ok(record) => {
                records.push(record);
                stats.ok += 1;
            }
            Err(e) => {
                warn!("Failed {} ({}): {:#}", seed.name, seed.place_id, e);
                stats.errors += 1;
            }
        }
        pb.inc(1);

        if opts.checkpoint_interval > 0 && position % opts.checkpoint_interval == 0 {
            write_json(&opts.output, &records)?;
            stats.checkpoints += 1;
            info!("Checkpoint: {} places saved", records.len());
        }
    }

    write_json(&opts.output, &records)?;
    stats.checkpoints += 1;
    pb.finish_and_clear();

    info!("{}/{} places scraped ({} errors)", stats.ok, total, stats.errors);
    info!("Output: {}", opts.output.display());
    Ok(stats)
}

/// Pretty JSON, non-ASCII kept verbatim. Written beside `path` and renamed over it
/// so an interrupted write leaves the previous file intact.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize records")?;
    let tmp = tmp_path(path);
    fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to move {} into place", tmp.display()))?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
