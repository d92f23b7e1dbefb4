use std::sync::LazyLock;

use regex::Regex;
use scraper::Selector;

use super::{first_match, Strategy};
use crate::snapshot::{attr, text_of, Snapshot};

const LABEL_PREFIXES: &[&str] = &["Price:", "Giá:"];

static PRICE_LABELS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span[aria-label*='Price'], span[aria-label*='Giá']").unwrap());
static SPANS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").unwrap());
static PRICE_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\$₫]{1,4}$").unwrap());

const STRATEGIES: &[(&str, Strategy<String>)] = &[("price_label", price_label), ("price_token", price_token)];

pub fn extract(snap: &Snapshot) -> Option<String> {
    first_match("price", snap, STRATEGIES)
}

fn price_label(snap: &Snapshot) -> Option<String> {
    snap.select(&PRICE_LABELS)
        .filter_map(|s| attr(&s, "aria-label"))
        // "Giá" is also a substring of the review-count label.
        .filter(|label| !label.to_lowercase().contains("đánh giá"))
        .find_map(|label| {
            let (_, value) = LABEL_PREFIXES.iter().find_map(|p| label.split_once(*p))?;
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        })
}

fn price_token(snap: &Snapshot) -> Option<String> {
    snap.select(&SPANS)
        .map(|s| text_of(&s))
        .find(|t| PRICE_TOKEN.is_match(t))
}
