use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use itertools::Itertools;
use regex::Regex;
use serde_json::Value;
use tracing::info;

use crate::batch::write_json;

pub const DEFAULT_PATTERN: &str = "*_scraped_*.json";
pub const DEFAULT_OUTPUT: &str = "merged.json";

#[derive(Debug, Clone, PartialEq)]
pub struct MergeStats {
    pub files: usize,
    pub records: usize,
    pub unique: usize,
}

/// Concatenate every shard in `dir` matching `pattern` (sorted by name) and keep the
/// first record per `place_id`. Records are carried as raw JSON, so fields are
/// written back exactly as the shards had them. No matching files is not an error:
/// nothing is written.
pub fn merge_shards(dir: &Path, pattern: &str, output: Option<&Path>) -> Result<Option<MergeStats>> {
    let output = output.map(Path::to_path_buf).unwrap_or_else(|| dir.join(DEFAULT_OUTPUT));
    let files = matching_files(dir, pattern, &output)?;
    if files.is_empty() {
        info!("No files matching {} in {}", pattern, dir.display());
        return Ok(None);
    }

    let mut all = Vec::new();
    for file in &files {
        let raw = fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
        let records: Vec<Value> =
            serde_json::from_str(&raw).with_context(|| format!("Invalid shard {}", file.display()))?;
        info!("  {}: {}", display_name(file), records.len());
        all.extend(records);
    }

    let records = all.len();
    let unique: Vec<Value> = all.into_iter().unique_by(|r| r["place_id"].to_string()).collect();
    write_json(&output, &unique)?;
    info!("Merged {} places -> {}", unique.len(), output.display());

    Ok(Some(MergeStats {
        files: files.len(),
        records,
        unique: unique.len(),
    }))
}

fn matching_files(dir: &Path, pattern: &str, output: &Path) -> Result<Vec<PathBuf>> {
    let matcher = wildcard(pattern)?;
    let entries = fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() || path == output {
            continue;
        }
        if matcher.is_match(&display_name(&path)) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// `*` matches any run of characters and `?` exactly one; everything else is literal.
fn wildcard(pattern: &str) -> Result<Regex> {
    let body: String = pattern
        .chars()
        .map(|c| match c {
            '*' => ".*".to_string(),
            '?' => ".".to_string(),
            c => regex::escape(&c.to_string()),
        })
        .collect();
    Regex::new(&format!("^{body}$")).with_context(|| format!("Bad file pattern {pattern}"))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PlaceRecord, SeedRecord};
    use serde_json::json;
    use chrono::Local;

    fn record(id: &str, name: &str) -> PlaceRecord {
        let seed = SeedRecord {
            place_id: id.into(),
            name: name.into(),
            address: "Nha Trang".into(),
            lat: 12.2,
            lon: 109.2,
            kind: "museum".into(),
        };
        PlaceRecord::from_seed(&seed, Local::now())
    }

    #[test]
    fn first_shard_wins_on_duplicate_ids() {
        let dir = tempfile::tempdir().unwrap();
        write_json(&dir.path().join("m_scraped_0_2.json"), &vec![record("p1", "first"), record("p2", "b")]).unwrap();
        write_json(&dir.path().join("m_scraped_2_4.json"), &vec![record("p1", "second"), record("p3", "c")]).unwrap();
        write_json(&dir.path().join("notes.json"), &vec![record("p9", "ignored")]).unwrap();

        let stats = merge_shards(dir.path(), DEFAULT_PATTERN, None).unwrap().unwrap();
        assert_eq!(
            stats,
            MergeStats {
                files: 2,
                records: 4,
                unique: 3
            }
        );

        let merged: Vec<PlaceRecord> =
            serde_json::from_str(&fs::read_to_string(dir.path().join(DEFAULT_OUTPUT)).unwrap()).unwrap();
        let got: Vec<_> = merged.iter().map(|r| (r.place_id.as_str(), r.name.as_str())).collect();
        assert_eq!(got, vec![("p1", "first"), ("p2", "b"), ("p3", "c")]);
    }

    #[test]
    fn records_pass_through_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = json!([{
            "place_id": "p7",
            "name": "Tháp Bà Ponagar",
            "scraped_at": "2024-12-03 10:15:00",
            "district": "Vĩnh Phước"
        }]);
        write_json(&dir.path().join("old_scraped_0_1.json"), &legacy).unwrap();
        write_json(&dir.path().join("new_scraped_1_2.json"), &vec![record("p8", "b")]).unwrap();

        let stats = merge_shards(dir.path(), DEFAULT_PATTERN, None).unwrap().unwrap();
        assert_eq!(stats.unique, 2);

        let merged: Vec<Value> =
            serde_json::from_str(&fs::read_to_string(dir.path().join(DEFAULT_OUTPUT)).unwrap()).unwrap();
        assert_eq!(merged[1], legacy[0]);
        assert_eq!(merged[0]["place_id"], "p8");
    }

    #[test]
    fn no_matches_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(merge_shards(dir.path(), DEFAULT_PATTERN, None).unwrap(), None);
        assert!(!dir.path().join(DEFAULT_OUTPUT).exists());
    }

    #[test]
    fn wildcard_semantics() {
        let re = wildcard("a?_scraped_*.json").unwrap();
        assert!(re.is_match("ab_scraped_0_10.json"));
        assert!(!re.is_match("abc_scraped_0_10.json"));
        assert!(!re.is_match("ab_scraped_0_10xjson"));
    }
}
