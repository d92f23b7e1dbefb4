use std::sync::LazyLock;

use regex::Regex;
use scraper::Selector;

use super::{first_match, Strategy};
use crate::snapshot::{attr, Snapshot};

const MIN_PHONE_CHARS: usize = 8;
const LABEL_TOKENS: &[&str] = &["Điện thoại:", "Phone:"];

static TEL_ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("button[data-item-id^='phone:tel:']").unwrap());
static LABELLED_BUTTONS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("button[aria-label]").unwrap());
static TEL_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href^='tel:']").unwrap());
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\d\s\-\+\(\)]{8,}").unwrap());

const STRATEGIES: &[(&str, Strategy<String>)] = &[
    ("tel_item_id", tel_item_id),
    ("phone_label", phone_label),
    ("tel_link", tel_link),
];

pub fn extract(snap: &Snapshot) -> Option<String> {
    first_match("phone", snap, STRATEGIES)
}

fn accept(raw: &str) -> Option<String> {
    let phone = raw.trim();
    if phone.chars().count() >= MIN_PHONE_CHARS {
        Some(phone.to_string())
    } else {
        None
    }
}

fn tel_item_id(snap: &Snapshot) -> Option<String> {
    snap.select(&TEL_ITEM)
        .filter_map(|b| attr(&b, "data-item-id"))
        .find_map(|id| accept(id.strip_prefix("phone:tel:")?))
}

fn phone_label(snap: &Snapshot) -> Option<String> {
    snap.select(&LABELLED_BUTTONS)
        .filter_map(|b| attr(&b, "aria-label"))
        .filter(|label| LABEL_TOKENS.iter().any(|t| label.contains(t)))
        .find_map(|label| accept(PHONE_RE.find(label)?.as_str()))
}

fn tel_link(snap: &Snapshot) -> Option<String> {
    snap.select(&TEL_LINK)
        .filter_map(|a| attr(&a, "href"))
        .find_map(|href| accept(href.strip_prefix("tel:")?))
}
