use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use strsim::normalized_levenshtein;

use crate::text::normalize_place_name;

static PLACE_SEGMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/place/([^/@]+)").unwrap());
static RESOLVED_PLACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/place/[^/]+/@").unwrap());

/// Outcome of disambiguating a result list.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub index: usize,
    pub score: u8,
    /// `false` when no candidate reached the threshold and the first result was taken.
    pub matched: bool,
}

/// Pick the candidate whose name best matches `seed_name`.
///
/// Candidates are in result order; `None` entries (links without a readable name)
/// are not scored but still count as the first result for the fallback.
pub fn pick_candidate(seed_name: &str, candidates: &[Option<String>], threshold: u8) -> Option<Selection> {
    if candidates.is_empty() {
        return None;
    }
    let seed = normalize_place_name(seed_name);

    let mut best: Option<(usize, u8)> = None;
    for (index, name) in candidates.iter().enumerate() {
        let Some(name) = name else { continue };
        let score = score_names(&seed, &normalize_place_name(name));
        if best.map_or(score > 0, |(_, s)| score > s) {
            best = Some((index, score));
        }
    }

    match best {
        Some((index, score)) if score >= threshold => Some(Selection { index, score, matched: true }),
        other => Some(Selection {
            index: 0,
            score: other.map_or(0, |(_, s)| s),
            matched: false,
        }),
    }
}

/// Max of plain edit similarity and token-set similarity, both 0..=100.
/// Inputs are expected to be normalized already.
pub fn score_names(a: &str, b: &str) -> u8 {
    ratio(a, b).max(token_set_ratio(a, b))
}

pub fn ratio(a: &str, b: &str) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    (normalized_levenshtein(a, b) * 100.0).round() as u8
}

/// Order- and duplicate-insensitive token overlap: compares the shared tokens
/// against each side's shared+remaining tokens and keeps the best pairing.
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    let ta: BTreeSet<&str> = a.split_whitespace().collect();
    let tb: BTreeSet<&str> = b.split_whitespace().collect();
    if ta.is_empty() || tb.is_empty() {
        return 0;
    }

    let shared = join(ta.intersection(&tb));
    let only_a = join(ta.difference(&tb));
    let only_b = join(tb.difference(&ta));

    let combined_a = format!("{shared} {only_a}").trim().to_string();
    let combined_b = format!("{shared} {only_b}").trim().to_string();

    ratio(&shared, &combined_a)
        .max(ratio(&shared, &combined_b))
        .max(ratio(&combined_a, &combined_b))
}

fn join<'a, 's: 'a>(tokens: impl Iterator<Item = &'a &'s str>) -> String {
    tokens.copied().collect::<Vec<_>>().join(" ")
}

/// Display name encoded in a result link: `/place/<name>/...`, percent-decoded.
pub fn name_from_place_url(url: &str) -> Option<String> {
    let encoded = PLACE_SEGMENT_RE.captures(url)?.get(1)?.as_str();
    let decoded = urlencoding::decode(encoded).ok()?.replace('+', " ");
    let decoded = decoded.trim();
    if decoded.is_empty() {
        None
    } else {
        Some(decoded.to_string())
    }
}

/// `true` when the location shows a single resolved place rather than a result list.
pub fn is_resolved_place(url: &str) -> bool {
    !url.contains("/search/") && RESOLVED_PLACE_RE.is_match(url)
}
