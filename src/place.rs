use anyhow::{Context, Result};
use chrono::Local;
use tracing::{debug, info, warn};

use crate::config::{pause, Settings};
use crate::driver::PageDriver;
use crate::extract::{self, soft, with_snapshot};
use crate::matcher::{is_resolved_place, name_from_place_url, pick_candidate};
use crate::model::{PlaceRecord, SeedRecord};

const PLACE_LINKS: &str = "a[href*='/place/']";

/// Anything that can turn a seed into a record. The batch only sees this.
pub trait SeedScraper {
    fn scrape(&mut self, seed: &SeedRecord) -> Result<PlaceRecord>;
}

/// Drives one browser session through search, disambiguation and extraction.
pub struct PlaceScraper<D: PageDriver> {
    driver: D,
    settings: Settings,
}

impl<D: PageDriver> PlaceScraper<D> {
    pub fn new(driver: D, settings: Settings) -> Self {
        PlaceScraper { driver, settings }
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    pub fn search_url(&self, seed: &SeedRecord) -> String {
        format!(
            "{}/search/{}",
            self.settings.search_base_url.trim_end_matches('/'),
            urlencoding::encode(&seed.address)
        )
    }

    /// Land on the seed's place page. Returns the URL the browser ended up on.
    fn open_place(&mut self, seed: &SeedRecord) -> Result<String> {
        let url = self.search_url(seed);
        self.driver
            .navigate(&url)
            .with_context(|| format!("search page failed to load: {url}"))?;
        pause(self.settings.delays.search_settle_ms);

        let landed = self.driver.current_url().context("no current url after search")?;
        if is_resolved_place(&landed) {
            debug!(url = %landed, "search resolved directly");
            return Ok(landed);
        }
        Ok(self.choose_candidate(seed).unwrap_or(landed))
    }

    /// Pick the result whose name best matches the seed and follow it.
    /// `None` leaves the browser on the results page.
    fn choose_candidate(&mut self, seed: &SeedRecord) -> Option<String> {
        let driver = &mut self.driver;
        let links = soft(
            "candidates",
            "wait for results",
            driver.wait_for_elements(PLACE_LINKS, self.settings.link_wait()),
        )?;
        let links: Vec<_> = links.into_iter().take(self.settings.candidate_limit).collect();
        let names: Vec<Option<String>> = links
            .iter()
            .map(|link| {
                soft("candidates", "href", driver.attribute(link, "href"))
                    .flatten()
                    .and_then(|href| name_from_place_url(&href))
            })
            .collect();

        let pick = pick_candidate(&seed.name, &names, self.settings.match_threshold)?;
        if pick.matched {
            info!(score = pick.score, candidate = ?names[pick.index], "matched search result");
        } else {
            warn!(best = pick.score, "no result matched, taking the first");
        }
        soft("candidates", "click", driver.click(&links[pick.index]))?;
        pause(self.settings.delays.candidate_click_ms);
        soft("candidates", "url after click", driver.current_url())
    }

    fn extract_fields(&mut self, record: &mut PlaceRecord) {
        let driver: &mut dyn PageDriver = &mut self.driver;
        let settings = &self.settings;
        let delays = &settings.delays;

        let summary = with_snapshot(driver, "rating", |s| Some(extract::rating::extract(s))).unwrap_or_default();
        record.rating = summary.rating;
        record.rating_count = summary.count;
        info!(field = "rating", rating = ?record.rating, count = ?record.rating_count);

        record.category = with_snapshot(driver, "category", extract::category::extract);
        info!(field = "category", value = ?record.category);

        record.price_level = with_snapshot(driver, "price", extract::price::extract);
        info!(field = "price", value = ?record.price_level);

        record.new_address = with_snapshot(driver, "address", extract::address::extract);
        info!(field = "address", value = ?record.new_address);

        record.phone = with_snapshot(driver, "phone", extract::phone::extract);
        info!(field = "phone", value = ?record.phone);

        record.website = with_snapshot(driver, "website", extract::website::extract);
        info!(field = "website", value = ?record.website);

        record.opening_hours = extract::hours::extract(driver, delays.hours_expand_ms);
        info!(field = "hours", days = record.opening_hours.as_ref().map_or(0, |h| h.len()));

        record.images = extract::images::extract(driver, delays, settings.max_images);
        info!(field = "images", count = record.images.len());

        record.about = extract::about::extract(driver, delays);
        info!(field = "about", count = record.about.as_ref().map_or(0, Vec::len));

        record.comments = extract::reviews::extract(driver, delays, settings.reviews_per_place, record.scraped_at);
        info!(field = "reviews", count = record.comments.len());
    }
}

impl<D: PageDriver> SeedScraper for PlaceScraper<D> {
    fn scrape(&mut self, seed: &SeedRecord) -> Result<PlaceRecord> {
        let mut record = PlaceRecord::from_seed(seed, Local::now());
        match self.open_place(seed) {
            Ok(url) => {
                record.google_maps_url = Some(url);
                self.extract_fields(&mut record);
            }
            // The browser may still show the previous place, so nothing is read.
            Err(e) => warn!(place_id = %seed.place_id, "keeping seed fields only: {:#}", e),
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Delays;
    use crate::driver::fake::{FakeDriver, FakeElement};

    fn settings() -> Settings {
        Settings {
            link_wait_secs: 0,
            delays: Delays::none(),
            ..Settings::default()
        }
    }

    fn seed(name: &str) -> SeedRecord {
        SeedRecord {
            place_id: "p1".into(),
            name: name.into(),
            address: "16 Trần Phú, Nha Trang".into(),
            lat: 12.25,
            lon: 109.19,
            kind: "museum".into(),
        }
    }

    fn fixture() -> String {
        std::fs::read_to_string("tests/fixtures/place_vi.html").unwrap()
    }

    const PLACE_URL: &str = "https://www.google.com/maps/place/B%E1%BA%A3o+t%C3%A0ng+H%E1%BA%A3i+d%C6%B0%C6%A1ng+h%E1%BB%8Dc/@12.2,109.2,17z";

    #[test]
    fn search_url_encodes_address() {
        let scraper = PlaceScraper::new(FakeDriver::default(), settings());
        assert_eq!(
            scraper.search_url(&seed("x")),
            "https://www.google.com/maps/search/16%20Tr%E1%BA%A7n%20Ph%C3%BA%2C%20Nha%20Trang"
        );
    }

    #[test]
    fn resolved_search_extracts_every_field() {
        let mut driver = FakeDriver::default();
        driver.after_navigate = Some((PLACE_URL.into(), fixture()));
        let mut scraper = PlaceScraper::new(driver, settings());

        let record = scraper.scrape(&seed("Bảo tàng Hải dương học")).unwrap();
        assert_eq!(record.place_id, "p1");
        assert_eq!(record.google_maps_url.as_deref(), Some(PLACE_URL));
        assert_eq!(record.rating, Some(4.6));
        assert_eq!(record.rating_count, Some(12345));
        assert_eq!(record.category.as_deref(), Some("Bảo tàng hải dương học"));
        assert_eq!(record.price_level.as_deref(), Some("₫"));
        assert_eq!(record.new_address.as_deref(), Some("01 Cầu Đá, Vĩnh Nguyên, Nha Trang, Khánh Hòa"));
        assert_eq!(record.phone.as_deref(), Some("02583590036"));
        assert_eq!(record.website.as_deref(), Some("http://vnio.org.vn/"));
        let hours = record.opening_hours.unwrap();
        assert_eq!(hours.get("Thứ Hai").map(String::as_str), Some("06:00-18:00"));
        assert_eq!(hours.len(), 7);
        assert_eq!(record.images.len(), 2);
        // No tabs are registered on the fake page, so tab-gated fields stay empty.
        assert_eq!(record.about, None);
        assert_eq!(record.comments.len(), 2);
        assert_eq!(record.comments[0].author, "Trần Minh");
    }

    #[test]
    fn picks_best_matching_candidate() {
        let mut driver = FakeDriver::with_page("https://www.google.com/maps/search/x", "<html></html>");
        driver.add(
            PLACE_LINKS,
            FakeElement::new("").attr("href", "https://www.google.com/maps/place/Nh%C3%A0+h%C3%A0ng+Bi%E1%BB%83n/data"),
        );
        driver.add(
            PLACE_LINKS,
            FakeElement::new("")
                .attr("href", "https://www.google.com/maps/place/B%E1%BA%A3o+t%C3%A0ng+H%E1%BA%A3i+d%C6%B0%C6%A1ng+h%E1%BB%8Dc/data")
                .navigates_to(PLACE_URL, &fixture()),
        );
        let mut scraper = PlaceScraper::new(driver, settings());

        let record = scraper.scrape(&seed("Bao tang Hai duong hoc - Chi nhanh 2")).unwrap();
        assert_eq!(record.google_maps_url.as_deref(), Some(PLACE_URL));
        assert_eq!(record.phone.as_deref(), Some("02583590036"));
        assert_eq!(scraper.into_driver().clicks.len(), 1);
    }

    #[test]
    fn no_candidates_keeps_results_page() {
        let search = "https://www.google.com/maps/search/x";
        let driver = FakeDriver::with_page(search, "<html></html>");
        let mut scraper = PlaceScraper::new(driver, settings());
        let record = scraper.scrape(&seed("Bảo tàng")).unwrap();
        assert!(record.google_maps_url.unwrap().contains("/search/"));
        assert_eq!(record.new_address, None);
        assert!(record.comments.is_empty());
    }

    #[test]
    fn failed_navigation_keeps_seed_fields() {
        let mut driver = FakeDriver::with_page(PLACE_URL, &fixture());
        driver.fail_navigation = true;
        let mut scraper = PlaceScraper::new(driver, settings());

        let record = scraper.scrape(&seed("Bảo tàng")).unwrap();
        assert_eq!(record.place_id, "p1");
        assert_eq!(record.name, "Bảo tàng");
        assert_eq!(record.original_address, "16 Trần Phú, Nha Trang");
        assert_eq!((record.lat, record.lon), (12.25, 109.19));
        assert_eq!(record.google_maps_url, None);
        // The previous page is still loaded but must not leak into this record.
        assert_eq!(record.phone, None);
        assert_eq!(record.opening_hours, None);
        assert!(record.images.is_empty());
    }
}
