use std::sync::LazyLock;

use indexmap::IndexSet;
use scraper::Selector;
use serde_json::Value;
use tracing::debug;

use super::{activate_tab, scroll_containers, soft, with_snapshot};
use crate::config::Delays;
use crate::driver::PageDriver;
use crate::model::{AmenityTag, Polarity};
use crate::snapshot::{attr, Snapshot};

const TAB_LABELS: &[&str] = &["about", "giới thiệu", "thông tin"];
const SCROLLABLES: &str = "div[role='main'], div.m6QErb";
const SCROLL_SIGNALS: usize = 5;
const MIN_LABEL_CHARS: usize = 3;
const MAX_LABEL_CHARS: usize = 100;
const MIN_TAG_CHARS: usize = 5;

const ALL_LABELS_SCRIPT: &str = "return Array.from(document.querySelectorAll('[aria-label]'))\
                                 .map(function (e) { return e.getAttribute('aria-label'); });";

/// How a label prefix maps onto a tag.
enum Rule {
    /// Prefix is a yes/no marker; the remainder is the feature.
    Strip(Polarity),
    /// Prefix is part of the feature name; its presence implies yes.
    Keep,
}

/// Checked in order; the first matching prefix decides.
const RULES: &[(&str, Rule)] = &[
    ("Có: ", Rule::Strip(Polarity::Affirmative)),
    ("Không: ", Rule::Strip(Polarity::Negative)),
    ("Có ", Rule::Strip(Polarity::Affirmative)),
    ("Không ", Rule::Strip(Polarity::Negative)),
    ("Chấp nhận ", Rule::Strip(Polarity::Affirmative)),
    ("Phù hợp ", Rule::Keep),
    ("Thích hợp ", Rule::Keep),
    ("Yes: ", Rule::Strip(Polarity::Affirmative)),
    ("No: ", Rule::Strip(Polarity::Negative)),
    ("Has ", Rule::Strip(Polarity::Affirmative)),
    ("Doesn't have ", Rule::Strip(Polarity::Negative)),
    ("No ", Rule::Strip(Polarity::Negative)),
    ("Accepts ", Rule::Strip(Polarity::Affirmative)),
    ("Good for ", Rule::Keep),
    ("Picnic", Rule::Keep),
    ("Wifi", Rule::Keep),
    ("Toilet", Rule::Keep),
    ("Restroom", Rule::Keep),
    ("Parking", Rule::Keep),
    ("Wheelchair", Rule::Keep),
];

static LIST_ITEMS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li, [role='listitem']").unwrap());
static CLASS_CONTAINERS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div[class*='iNvpkc'], li[class*='hpLkke']").unwrap());
static LABELLED: LazyLock<Selector> = LazyLock::new(|| Selector::parse("[aria-label]").unwrap());

/// Map one accessible name to a tag, or `None` when it is not an amenity.
pub fn classify_amenity(label: &str) -> Option<AmenityTag> {
    let len = label.chars().count();
    if !(MIN_LABEL_CHARS..=MAX_LABEL_CHARS).contains(&len) {
        return None;
    }
    let tag = RULES.iter().find_map(|(prefix, rule)| {
        let rest = label.strip_prefix(prefix)?;
        Some(match rule {
            Rule::Strip(polarity) => AmenityTag::new(*polarity, rest),
            Rule::Keep => AmenityTag::new(Polarity::Affirmative, label),
        })
    })?;
    (tag.as_str().chars().count() > MIN_TAG_CHARS).then_some(tag)
}

pub fn extract(driver: &mut dyn PageDriver, delays: &Delays) -> Option<Vec<String>> {
    if !activate_tab(driver, "about", TAB_LABELS, delays.about_tab_ms) {
        return None;
    }
    scroll_containers(driver, "about", SCROLLABLES, SCROLL_SIGNALS, delays.about_scroll_ms);

    let mut tags = IndexSet::new();
    collect(&mut tags, live_labels(driver));
    with_snapshot(driver, "about", |snap| {
        collect(&mut tags, list_item_labels(snap));
        collect(&mut tags, class_container_labels(snap));
        Some(())
    });
    debug!(count = tags.len(), "amenities classified");

    if tags.is_empty() {
        None
    } else {
        Some(tags.into_iter().map(AmenityTag::into_string).collect())
    }
}

fn collect(tags: &mut IndexSet<AmenityTag>, labels: impl IntoIterator<Item = String>) {
    tags.extend(labels.into_iter().filter_map(|l| classify_amenity(&l)));
}

/// Every accessible name in the live document, read in one round trip.
fn live_labels(driver: &mut dyn PageDriver) -> Vec<String> {
    match soft("about", "label script", driver.execute_script(ALL_LABELS_SCRIPT, &[])) {
        Some(Value::Array(values)) => values
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Labels on list items and anything labelled inside them.
pub fn list_item_labels(snap: &Snapshot) -> Vec<String> {
    labels_within(snap, &LIST_ITEMS)
}

pub fn class_container_labels(snap: &Snapshot) -> Vec<String> {
    labels_within(snap, &CLASS_CONTAINERS)
}

fn labels_within(snap: &Snapshot, containers: &Selector) -> Vec<String> {
    let mut labels = Vec::new();
    for item in snap.select(containers) {
        labels.extend(attr(&item, "aria-label").map(str::to_string));
        labels.extend(
            item.select(&LABELLED)
                .filter_map(|child| attr(&child, "aria-label"))
                .map(str::to_string),
        );
    }
    labels
}
