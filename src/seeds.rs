use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::model::SeedRecord;

/// Read seeds from a `place_id,name,address,lat,lon,type` CSV. Rows that fail to
/// parse are logged and skipped.
pub fn load_seeds(path: &Path) -> Result<Vec<SeedRecord>> {
    let raw = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let text = raw.strip_prefix('\u{feff}').unwrap_or(&raw);

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut seeds = Vec::new();
    for (row, result) in reader.deserialize::<SeedRecord>().enumerate() {
        match result {
            Ok(seed) => seeds.push(seed),
            Err(e) => warn!("Skipping row {} of {}: {}", row + 2, path.display(), e),
        }
    }
    info!("Loaded {} seeds from {}", seeds.len(), path.display());
    Ok(seeds)
}

/// `seeds[start..end]`, clamped to the list.
pub fn select_range(seeds: Vec<SeedRecord>, start: usize, end: Option<usize>) -> Vec<SeedRecord> {
    let end = end.unwrap_or(seeds.len()).min(seeds.len());
    let start = start.min(end);
    seeds.into_iter().skip(start).take(end - start).collect()
}

/// Output file next to the input, named after the range that was requested.
pub fn default_output_path(input: &Path, start: usize, end: Option<usize>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "places".into());
    let file = match end {
        Some(end) => format!("{stem}_scraped_{start}_{end}.json"),
        None if start > 0 => format!("{stem}_scraped_from_{start}.json"),
        None => format!("{stem}_scraped.json"),
    };
    input.with_file_name(file)
}
