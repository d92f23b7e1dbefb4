//! Field extractors.
//!
//! Each field is a ranked list of independent strategies over a captured
//! [`Snapshot`]; the first one producing a validated value wins. Extractors that
//! live behind a tab or a collapsed control run in two phases: a trigger phase
//! that pokes the live page (click, scroll, expand, settle), then a pure parse
//! phase over a snapshot taken afterwards.

pub mod about;
pub mod address;
pub mod category;
pub mod dates;
pub mod hours;
pub mod images;
pub mod phone;
pub mod price;
pub mod rating;
pub mod reviews;
pub mod website;

use tracing::{debug, warn};

use crate::config::pause;
use crate::driver::{DriverResult, Element, PageDriver};
use crate::snapshot::Snapshot;

/// One extraction technique. `None` means "nothing usable here, try the next one".
pub type Strategy<T> = fn(&Snapshot) -> Option<T>;

/// Run `strategies` in order and return the first hit.
pub fn first_match<T>(field: &str, snap: &Snapshot, strategies: &[(&'static str, Strategy<T>)]) -> Option<T> {
    strategies.iter().find_map(|(name, strategy)| {
        let value = strategy(snap)?;
        debug!(field, strategy = name, "strategy matched");
        Some(value)
    })
}

/// Capture the page fresh and hand it to `parse`. A failed capture reads as absent.
pub fn with_snapshot<T>(
    driver: &mut dyn PageDriver,
    field: &str,
    parse: impl FnOnce(&Snapshot) -> Option<T>,
) -> Option<T> {
    match Snapshot::capture(driver) {
        Ok(snap) => parse(&snap),
        Err(e) => {
            warn!(field, error = %e, "could not capture page");
            None
        }
    }
}

/// Swallow an interaction failure: log it and treat the step as a miss.
pub fn soft<T>(field: &str, step: &str, result: DriverResult<T>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            debug!(field, step, error = %e, "interaction failed");
            None
        }
    }
}

const TAB_SELECTOR: &str = "button[role='tab']";

/// Click the first tab whose label contains any of `labels` (lowercase).
/// Returns `false` when the page has no such tab.
pub fn activate_tab(driver: &mut dyn PageDriver, field: &str, labels: &[&str], settle_ms: u64) -> bool {
    let tabs = soft(field, "find tabs", driver.find_elements(TAB_SELECTOR)).unwrap_or_default();
    for tab in tabs {
        let Some(text) = soft(field, "tab text", driver.text(&tab)) else {
            continue;
        };
        let text = text.to_lowercase();
        if labels.iter().any(|l| text.contains(l)) {
            if soft(field, "click tab", driver.click(&tab)).is_none() {
                return false;
            }
            pause(settle_ms);
            return true;
        }
    }
    debug!(field, "tab not present");
    false
}

const SCROLL_TO_BOTTOM: &str = "arguments[0].scrollTop = arguments[0].scrollHeight";

/// Nudge lazily-loaded content into the DOM by scrolling each container to the bottom.
pub fn scroll_containers(driver: &mut dyn PageDriver, field: &str, css: &str, times: usize, step_ms: u64) {
    let containers: Vec<Element> = soft(field, "find scrollables", driver.find_elements(css)).unwrap_or_default();
    for container in &containers {
        for _ in 0..times {
            if soft(field, "scroll", driver.execute_script(SCROLL_TO_BOTTOM, &[container])).is_none() {
                break;
            }
            pause(step_ms);
        }
    }
}
