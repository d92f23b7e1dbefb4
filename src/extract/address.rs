use std::sync::LazyLock;

use scraper::Selector;

use super::{first_match, Strategy};
use crate::clean::clean_address;
use crate::snapshot::{attr, find_in, text_of, Snapshot};

const PREFIXES: &[&str] = &["Địa chỉ:", "Address:"];

static ADDRESS_BUTTON: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("button[data-item-id='address']").unwrap());
static LABELLED_BUTTONS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("button[aria-label]").unwrap());
static ITEM_BUTTONS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("button[data-item-id]").unwrap());
static ADDRESS_TEXT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div[class*='Io6YTe']").unwrap());

const STRATEGIES: &[(&str, Strategy<String>)] = &[
    ("address_button_label", address_button_label),
    ("prefixed_label", prefixed_label),
    ("address_button_text", address_button_text),
];

pub fn extract(snap: &Snapshot) -> Option<String> {
    first_match("address", snap, STRATEGIES)
}

fn address_button_label(snap: &Snapshot) -> Option<String> {
    let label = snap.select(&ADDRESS_BUTTON).find_map(|b| attr(&b, "aria-label"))?;
    let stripped = PREFIXES
        .iter()
        .fold(label.to_string(), |acc, p| acc.replace(&format!("{p} "), ""));
    clean_address(stripped.trim())
}

fn prefixed_label(snap: &Snapshot) -> Option<String> {
    snap.select(&LABELLED_BUTTONS).find_map(|b| {
        let label = attr(&b, "aria-label")?;
        if !PREFIXES.iter().any(|p| label.starts_with(p)) {
            return None;
        }
        let (_, rest) = label.split_once(':')?;
        clean_address(rest.trim())
    })
}

fn address_button_text(snap: &Snapshot) -> Option<String> {
    snap.select(&ITEM_BUTTONS)
        .filter(|b| attr(b, "data-item-id").is_some_and(|id| id.to_lowercase().contains("address")))
        .find_map(|b| clean_address(&text_of(&find_in(&b, &ADDRESS_TEXT)?)))
}
