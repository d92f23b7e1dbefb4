use std::sync::LazyLock;

use regex::Regex;
use scraper::Selector;
use tracing::debug;

use crate::snapshot::{attr, text_of, Snapshot};

/// Aggregate score and number of reviews; either half may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RatingSummary {
    pub rating: Option<f32>,
    pub count: Option<u32>,
}

/// One locale's accessible-name vocabulary for the rating control.
struct LabelLocale {
    selector: &'static LazyLock<Selector>,
    rating: &'static LazyLock<Regex>,
    count: &'static LazyLock<Regex>,
}

static VI_LABEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span[aria-label*='sao']").unwrap());
static VI_RATING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+[,.]?\d*)\s*sao").unwrap());
static VI_COUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+[\.,]?\d*)\s*đánh giá").unwrap());

static EN_LABEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span[aria-label*='star']").unwrap());
static EN_RATING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+[,.]?\d*)\s*star").unwrap());
static EN_COUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+[\.,]?\d*)\s*review").unwrap());

static LOCALES: [LabelLocale; 2] = [
    LabelLocale {
        selector: &VI_LABEL,
        rating: &VI_RATING,
        count: &VI_COUNT,
    },
    LabelLocale {
        selector: &EN_LABEL,
        rating: &EN_RATING,
        count: &EN_COUNT,
    },
];

static DISPLAY_LARGE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.fontDisplayLarge").unwrap());
static BARE_SCORE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+[,.]?\d*$").unwrap());
static BUTTONS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("button").unwrap());
static PAREN_COUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\((\d{1,3}(?:[,\.]\d{3})*)\)").unwrap());

pub fn extract(snap: &Snapshot) -> RatingSummary {
    let mut summary = RatingSummary::default();

    for locale in &LOCALES {
        if summary.rating.is_some() {
            break;
        }
        let found = from_label(snap, locale);
        summary.rating = found.rating;
        summary.count = found.count.or(summary.count);
    }

    if summary.rating.is_none() {
        summary.rating = from_display(snap);
    }
    if summary.count.is_none() {
        summary.count = from_parenthesized(snap);
    }
    debug!(rating = ?summary.rating, count = ?summary.count, "rating parsed");
    summary
}

fn from_label(snap: &Snapshot, locale: &LabelLocale) -> RatingSummary {
    let Some(label) = snap.select(locale.selector).next().and_then(|s| attr(&s, "aria-label")) else {
        return RatingSummary::default();
    };
    RatingSummary {
        rating: locale
            .rating
            .captures(label)
            .and_then(|c| parse_score(&c[1]))
            .filter(|r| (0.0..=5.0).contains(r)),
        count: locale.count.captures(label).and_then(|c| parse_count(&c[1])),
    }
}

fn from_display(snap: &Snapshot) -> Option<f32> {
    snap.select(&DISPLAY_LARGE)
        .map(|d| text_of(&d))
        .filter(|t| BARE_SCORE.is_match(t))
        .filter_map(|t| parse_score(&t))
        .find(|r| (1.0..=5.0).contains(r))
}

fn from_parenthesized(snap: &Snapshot) -> Option<u32> {
    snap.select(&BUTTONS)
        .find_map(|b| PAREN_COUNT.captures(&text_of(&b)).and_then(|c| parse_count(&c[1])))
}

/// Decimal comma or point.
fn parse_score(raw: &str) -> Option<f32> {
    raw.replace(',', ".").parse().ok()
}

/// Thousands separators of either kind are dropped.
fn parse_count(raw: &str) -> Option<u32> {
    raw.replace(['.', ','], "").parse().ok()
}
