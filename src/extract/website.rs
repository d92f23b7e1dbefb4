use std::sync::LazyLock;

use scraper::Selector;

use super::{first_match, Strategy};
use crate::clean::clean_website;
use crate::snapshot::{attr, Snapshot};

static AUTHORITY_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[data-item-id='authority']").unwrap());
static WEBSITE_LABEL_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[aria-label*='website'], a[aria-label*='Website'], a[aria-label*='Trang web']").unwrap());

const STRATEGIES: &[(&str, Strategy<String>)] = &[
    ("authority_link", authority_link),
    ("website_label", website_label),
];

pub fn extract(snap: &Snapshot) -> Option<String> {
    first_match("website", snap, STRATEGIES)
}

fn authority_link(snap: &Snapshot) -> Option<String> {
    let href = snap.select(&AUTHORITY_LINK).next().and_then(|a| attr(&a, "href"))?;
    clean_website(href)
}

fn website_label(snap: &Snapshot) -> Option<String> {
    let href = snap
        .select(&WEBSITE_LABEL_LINK)
        .filter_map(|a| attr(&a, "href"))
        .find(|href| !href.starts_with("tel:"))?;
    clean_website(href)
}
