use std::sync::LazyLock;

use indexmap::IndexMap;
use scraper::{ElementRef, Selector};
use tracing::debug;

use super::{soft, with_snapshot};
use crate::config::pause;
use crate::driver::{DriverResult, Element, PageDriver};
use crate::snapshot::{attr, find_in, text_of, Snapshot};

/// Day name (as the page writes it) to a time range, in page order.
pub type WeeklyHours = IndexMap<String, String>;

const HOURS_TOGGLE: &str = "button[data-item-id='oh']";
const STATUS_BUTTONS: &str = "button[aria-label*='Đang mở'], button[aria-label*='Đã đóng'], \
                              button[aria-label*='Open'], button[aria-label*='Closed']";
const LIVE_ROWS: &str = "table.eK4R0e tr.y0skZc";
const LIVE_DAY: &str = "td.ylH6lf";
const LIVE_TIME: &str = "td.mxowUb";

static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table[class*='eK4R0e']").unwrap());
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr[class*='y0skZc']").unwrap());
static DAY_CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td[class*='ylH6lf']").unwrap());
static TIME_CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td[class*='mxowUb']").unwrap());
static TIME_ITEM: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li[class*='G8aQO']").unwrap());

pub fn extract(driver: &mut dyn PageDriver, expand_ms: u64) -> Option<WeeklyHours> {
    expand(driver, expand_ms);
    let parsed = with_snapshot(driver, "hours", parse).filter(|h| !h.is_empty());
    if parsed.is_some() {
        return parsed;
    }
    debug!("hours table missing from snapshot, reading live rows");
    soft("hours", "live rows", parse_live(driver)).filter(|h| !h.is_empty())
}

/// Open the weekly table unless it is already open.
fn expand(driver: &mut dyn PageDriver, expand_ms: u64) {
    let toggles = soft("hours", "find toggle", driver.find_elements(HOURS_TOGGLE)).unwrap_or_default();
    if let Some(toggle) = toggles.first() {
        let expanded = soft("hours", "aria-expanded", driver.attribute(toggle, "aria-expanded")).flatten();
        if expanded.as_deref() != Some("true") && soft("hours", "click toggle", driver.click(toggle)).is_some() {
            pause(expand_ms);
        }
        return;
    }
    let status = soft("hours", "find status", driver.find_elements(STATUS_BUTTONS)).unwrap_or_default();
    if let Some(button) = status.first() {
        if soft("hours", "click status", driver.click(button)).is_some() {
            pause(expand_ms);
        }
    }
}

pub fn parse(snap: &Snapshot) -> Option<WeeklyHours> {
    let table = snap.select(&TABLE).next()?;
    let mut hours = WeeklyHours::new();
    for row in table.select(&ROW) {
        let (Some(day), Some(cell)) = (find_in(&row, &DAY_CELL), find_in(&row, &TIME_CELL)) else {
            continue;
        };
        let day = text_of(&day);
        let range = cell_text(&cell);
        if !day.is_empty() && !range.is_empty() {
            hours.insert(day, normalize_range(&range));
        }
    }
    Some(hours)
}

/// Accessible name first, then the nested list item, then whatever text the cell has.
fn cell_text(cell: &ElementRef<'_>) -> String {
    if let Some(label) = attr(cell, "aria-label").map(str::trim).filter(|l| !l.is_empty()) {
        return label.to_string();
    }
    find_in(cell, &TIME_ITEM)
        .map(|li| text_of(&li))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| text_of(cell))
}

/// Rows read through the driver. A row that fails to read is skipped.
fn parse_live(driver: &mut dyn PageDriver) -> DriverResult<WeeklyHours> {
    let mut hours = WeeklyHours::new();
    for row in driver.find_elements(LIVE_ROWS)? {
        if let Some((day, range)) = soft("hours", "live row", live_row(driver, &row)).flatten() {
            hours.insert(day, normalize_range(&range));
        }
    }
    Ok(hours)
}

fn live_row(driver: &mut dyn PageDriver, row: &Element) -> DriverResult<Option<(String, String)>> {
    let (Some(day), Some(cell)) = (
        driver.find_child_elements(row, LIVE_DAY)?.into_iter().next(),
        driver.find_child_elements(row, LIVE_TIME)?.into_iter().next(),
    ) else {
        return Ok(None);
    };
    let day = driver.text(&day)?.trim().to_string();
    let range = match driver.attribute(&cell, "aria-label")?.filter(|l| !l.trim().is_empty()) {
        Some(label) => label,
        None => driver.text(&cell)?.trim().to_string(),
    };
    Ok((!day.is_empty() && !range.is_empty()).then_some((day, range)))
}

/// "08:00 đến 17:00" and "08:00–17:00" both become "08:00-17:00".
pub fn normalize_range(raw: &str) -> String {
    raw.trim().replace(" đến ", "-").replace("đến", "-").replace('–', "-")
}
