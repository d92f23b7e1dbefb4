use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::Selector;

use super::{activate_tab, soft, with_snapshot};
use crate::config::{pause, Delays};
use crate::driver::PageDriver;
use crate::snapshot::{attr, Snapshot};

const TAB_LABELS: &[&str] = &["photo", "hình", "ảnh"];
const CDN_HOSTS: &[&str] = &["googleusercontent.com", "ggpht.com"];
const THUMBNAIL_WIDTHS: &[u32] = &[24, 30, 32, 36, 48, 64];
const MIN_WIDTH: u32 = 100;
const PAGE_SCROLL: &str = "window.scrollBy(0, 300)";
const PAGE_SCROLLS: usize = 2;

static IMAGES: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img[src]").unwrap());
static WIDTH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"=w(\d+)").unwrap());

pub fn extract(driver: &mut dyn PageDriver, delays: &Delays, cap: usize) -> Vec<String> {
    activate_tab(driver, "images", TAB_LABELS, delays.tab_ms);
    for _ in 0..PAGE_SCROLLS {
        if soft("images", "scroll", driver.execute_script(PAGE_SCROLL, &[])).is_none() {
            break;
        }
        pause(delays.image_scroll_ms);
    }
    with_snapshot(driver, "images", |snap| Some(parse(snap, cap))).unwrap_or_default()
}

/// Full-size CDN photos, one per distinct asset, at most `cap`.
pub fn parse(snap: &Snapshot, cap: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    snap.select(&IMAGES)
        .filter_map(|img| attr(&img, "src"))
        .filter(|src| is_photo(src))
        .filter(|src| seen.insert(asset_base(src).to_string()))
        .take(cap)
        .map(str::to_string)
        .collect()
}

fn is_photo(src: &str) -> bool {
    if !CDN_HOSTS.iter().any(|h| src.contains(h)) {
        return false;
    }
    WIDTH
        .captures(src)
        .and_then(|c| c[1].parse::<u32>().ok())
        .is_some_and(|w| !THUMBNAIL_WIDTHS.contains(&w) && w >= MIN_WIDTH)
}

/// The URL without its size-variant suffix.
fn asset_base(src: &str) -> &str {
    src.split("=w").next().unwrap_or(src)
}
