use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

const CONFIG_FILE: &str = "place_scraper";
const ENV_PREFIX: &str = "PLACE_SCRAPER";

/// Runtime settings: defaults, then `place_scraper.toml`, then `PLACE_SCRAPER_*` env vars.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub webdriver_url: String,
    pub headless: bool,
    pub page_load_timeout_secs: u64,
    pub search_base_url: String,
    pub reviews_per_place: usize,
    pub max_images: usize,
    pub candidate_limit: usize,
    pub match_threshold: u8,
    pub checkpoint_interval: usize,
    pub link_wait_secs: u64,
    pub delays: Delays,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            webdriver_url: "http://localhost:9515".into(),
            headless: true,
            page_load_timeout_secs: 30,
            search_base_url: "https://www.google.com/maps".into(),
            reviews_per_place: 3,
            max_images: 3,
            candidate_limit: 10,
            match_threshold: 50,
            checkpoint_interval: 10,
            link_wait_secs: 5,
            delays: Delays::default(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")
    }

    pub fn link_wait(&self) -> Duration {
        Duration::from_secs(self.link_wait_secs)
    }
}

/// Settle waits (milliseconds) after interactions whose effect renders asynchronously.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Delays {
    pub search_settle_ms: u64,
    pub candidate_click_ms: u64,
    pub hours_expand_ms: u64,
    pub about_tab_ms: u64,
    pub tab_ms: u64,
    pub about_scroll_ms: u64,
    pub review_scroll_ms: u64,
    pub image_scroll_ms: u64,
    pub expand_click_ms: u64,
    pub expand_settle_ms: u64,
}

impl Default for Delays {
    fn default() -> Self {
        Delays {
            search_settle_ms: 4000,
            candidate_click_ms: 2500,
            hours_expand_ms: 1200,
            about_tab_ms: 2500,
            tab_ms: 1500,
            about_scroll_ms: 300,
            review_scroll_ms: 500,
            image_scroll_ms: 300,
            expand_click_ms: 300,
            expand_settle_ms: 500,
        }
    }
}

#[cfg(test)]
impl Delays {
    pub fn none() -> Self {
        Delays {
            search_settle_ms: 0,
            candidate_click_ms: 0,
            hours_expand_ms: 0,
            about_tab_ms: 0,
            tab_ms: 0,
            about_scroll_ms: 0,
            review_scroll_ms: 0,
            image_scroll_ms: 0,
            expand_click_ms: 0,
            expand_settle_ms: 0,
        }
    }
}

pub fn pause(ms: u64) {
    if ms > 0 {
        thread::sleep(Duration::from_millis(ms));
    }
}
